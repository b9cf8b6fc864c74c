//! Thompson sampling index
//!
//! Each arm's index is one sample from its Beta posterior under a uniform
//! prior: `Beta(1 + successes, 1 + failures)`.

use super::{ArmStats, IndexPolicy};
use crate::rng::RandomSource;
use rand_distr::{Beta, Distribution};

/// Randomized posterior-sampling index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThompsonSamplingPolicy;

impl IndexPolicy for ThompsonSamplingPolicy {
    fn arm_index(&self, stats: ArmStats, _round: usize, rng: &mut dyn RandomSource) -> f64 {
        let alpha = 1.0 + stats.reward_sum as f64;
        let beta = 1.0 + stats.failures() as f64;
        match Beta::new(alpha, beta) {
            Ok(posterior) => posterior.sample(rng),
            // Unreachable with the uniform prior; fall back to the posterior mean
            Err(_) => alpha / (alpha + beta),
        }
    }

    fn name(&self) -> &'static str {
        "ts"
    }
}
