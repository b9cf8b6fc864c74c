//! Upper confidence bound index
//!
//! `ucb = reward_sum / draws + sqrt(2 ln(t) / draws)`

use super::{ArmStats, IndexPolicy};
use crate::rng::RandomSource;

/// Deterministic UCB index; consumes no randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct UcbPolicy;

impl IndexPolicy for UcbPolicy {
    fn arm_index(&self, stats: ArmStats, round: usize, _rng: &mut dyn RandomSource) -> f64 {
        let n = stats.draws as f64;
        let exploration = (2.0 * (round as f64).ln() / n).sqrt();
        stats.empirical_mean() + exploration
    }

    fn name(&self) -> &'static str {
        "ucb"
    }
}
