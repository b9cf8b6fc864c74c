//! Scripted random source for deterministic tests
//!
//! Replays fixed sequences instead of generating randomness. Available in
//! all builds so integration tests can drive the orchestrator through
//! `Orchestrator::with_rng`; simulation code never constructs one.

use super::RandomSource;

/// Replays fixed uniform values and indices, cycling when exhausted.
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::rng::{RandomSource, ScriptedRng};
///
/// // Every Bernoulli draw succeeds, every re-rank picks 0
/// let mut rng = ScriptedRng::new(vec![0.0], vec![0]);
/// assert_eq!(rng.bernoulli(0.1), 1);
/// assert_eq!(rng.index_below(3), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    uniforms: Vec<f64>,
    indices: Vec<usize>,
    uniform_pos: usize,
    index_pos: usize,
}

impl ScriptedRng {
    /// Create a source replaying `uniforms` for `next_f64` and `indices`
    /// (reduced modulo the requested bound) for `index_below`.
    ///
    /// # Panics
    /// Panics if either sequence is empty or a uniform is outside [0, 1)
    pub fn new(uniforms: Vec<f64>, indices: Vec<usize>) -> Self {
        assert!(!uniforms.is_empty(), "uniform script must not be empty");
        assert!(!indices.is_empty(), "index script must not be empty");
        assert!(
            uniforms.iter().all(|u| (0.0..1.0).contains(u)),
            "scripted uniforms must lie in [0, 1)"
        );
        Self {
            uniforms,
            indices,
            uniform_pos: 0,
            index_pos: 0,
        }
    }

    /// Number of uniforms consumed so far
    pub fn uniforms_consumed(&self) -> usize {
        self.uniform_pos
    }

    /// Number of indices consumed so far
    pub fn indices_consumed(&self) -> usize {
        self.index_pos
    }
}

impl RandomSource for ScriptedRng {
    /// Bits whose top 53 encode the next scripted uniform
    fn next_u64(&mut self) -> u64 {
        let value = self.next_f64();
        ((value * (1u64 << 53) as f64) as u64) << 11
    }

    fn next_f64(&mut self) -> f64 {
        let value = self.uniforms[self.uniform_pos % self.uniforms.len()];
        self.uniform_pos += 1;
        value
    }

    fn index_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "index bound must be positive");
        let value = self.indices[self.index_pos % self.indices.len()];
        self.index_pos += 1;
        value % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_cycle() {
        let mut rng = ScriptedRng::new(vec![0.25, 0.75], vec![2, 5]);
        assert_eq!(rng.next_f64(), 0.25);
        assert_eq!(rng.next_f64(), 0.75);
        assert_eq!(rng.next_f64(), 0.25);
        assert_eq!(rng.index_below(3), 2);
        assert_eq!(rng.index_below(3), 2); // 5 % 3
        assert_eq!(rng.uniforms_consumed(), 3);
        assert_eq!(rng.indices_consumed(), 2);
    }

    #[test]
    fn test_bits_decode_to_scripted_uniform() {
        let mut rng = ScriptedRng::new(vec![0.375], vec![0]);
        let bits = rng.next_u64();
        assert_eq!((bits >> 11) as f64 / (1u64 << 53) as f64, 0.375);
        assert_eq!(rng.uniforms_consumed(), 1);
    }

    #[test]
    #[should_panic(expected = "scripted uniforms must lie in [0, 1)")]
    fn test_rejects_out_of_range_uniform() {
        ScriptedRng::new(vec![1.0], vec![0]);
    }
}
