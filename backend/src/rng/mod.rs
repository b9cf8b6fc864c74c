//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the simulator MUST go through this module.
//!
//! Every consumer (reward draws, collision re-ranking, Thompson sampling)
//! takes a `&mut dyn RandomSource`, so a single handle per run drives the
//! whole simulation and tests can substitute [`ScriptedRng`].
//!
//! `dyn RandomSource` implements `rand_core::RngCore`, so `rand_distr`
//! distributions sample straight from the run's source:
//!
//! ```rust
//! use bandit_simulator_core_rs::rng::{RandomSource, RngManager};
//! use rand_distr::{Beta, Distribution};
//!
//! let mut rng = RngManager::new(7);
//! let source: &mut dyn RandomSource = &mut rng;
//! let x = Beta::new(2.0, 5.0).unwrap().sample(source);
//! assert!((0.0..=1.0).contains(&x));
//! ```

use rand_core::RngCore;

mod scripted;
mod xorshift;

pub use scripted::ScriptedRng;
pub use xorshift::RngManager;

/// Source of uniform randomness consumed by the simulation.
pub trait RandomSource {
    /// Next 64 random bits
    fn next_u64(&mut self) -> u64;

    /// Uniform index in [0, n)
    ///
    /// # Panics
    /// Panics if `n == 0`
    fn index_below(&mut self, n: usize) -> usize;

    /// Uniform f64 in [0.0, 1.0) from the top 53 bits
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Bernoulli trial: 1 with probability `p`, else 0
    fn bernoulli(&mut self, p: f64) -> u8 {
        if self.next_f64() < p {
            1
        } else {
            0
        }
    }
}

impl<'a> RngCore for dyn RandomSource + 'a {
    fn next_u32(&mut self) -> u32 {
        (RandomSource::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        RandomSource::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
