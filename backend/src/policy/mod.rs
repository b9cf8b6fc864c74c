//! Arm Index Policy Module
//!
//! This module defines how a user scores arms once warm-up is over.
//!
//! # Overview
//!
//! In steady state every user computes one index per arm from its own
//! statistics, ranks arms by descending index, and takes the arm at its
//! private `rank_to_consider`. Only the index differs between variants;
//! ranking, rank selection and collision handling are shared.
//!
//! # Policy Interface
//!
//! All policies implement the `IndexPolicy` trait:
//! ```rust
//! use bandit_simulator_core_rs::policy::{ArmStats, IndexPolicy};
//! use bandit_simulator_core_rs::rng::RandomSource;
//!
//! struct GreedyPolicy;
//!
//! impl IndexPolicy for GreedyPolicy {
//!     fn arm_index(&self, stats: ArmStats, _round: usize, _rng: &mut dyn RandomSource) -> f64 {
//!         stats.empirical_mean()
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "greedy"
//!     }
//! }
//! ```
//!
//! Available policies:
//! 1. **Ucb**: `mean + sqrt(2 ln t / n)` (deterministic)
//! 2. **ThompsonSampling**: sample of the Beta posterior (randomized)
//!
//! Policies are built from `PolicyConfig` by the orchestrator factory.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod thompson;
pub mod ucb;

pub use thompson::ThompsonSamplingPolicy;
pub use ucb::UcbPolicy;

/// Per-arm statistics observed by one user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmStats {
    /// Cumulative reward observed on this arm
    pub reward_sum: u64,
    /// Number of times this user drew the arm
    pub draws: u64,
}

impl ArmStats {
    /// Empirical success rate; 0 for an undrawn arm
    pub fn empirical_mean(&self) -> f64 {
        if self.draws == 0 {
            0.0
        } else {
            self.reward_sum as f64 / self.draws as f64
        }
    }

    /// Draws that returned zero reward
    pub fn failures(&self) -> u64 {
        self.draws.saturating_sub(self.reward_sum)
    }
}

/// Scores one arm for ranking. Higher is better.
///
/// Only called for arms with at least one draw.
pub trait IndexPolicy: Send + Sync {
    /// Index of an arm at `round` given this user's statistics for it
    fn arm_index(&self, stats: ArmStats, round: usize, rng: &mut dyn RandomSource) -> f64;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Policy selection for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolicyConfig {
    /// Upper confidence bound index
    #[default]
    #[serde(rename = "ucb", alias = "Ucb")]
    Ucb,

    /// Thompson sampling with a uniform Beta(1, 1) prior
    #[serde(rename = "ts", alias = "thompson", alias = "ThompsonSampling")]
    ThompsonSampling,
}

impl PolicyConfig {
    /// Instantiate the configured policy
    pub fn build(&self) -> Box<dyn IndexPolicy> {
        match self {
            PolicyConfig::Ucb => Box::new(UcbPolicy),
            PolicyConfig::ThompsonSampling => Box::new(ThompsonSamplingPolicy),
        }
    }
}

impl std::str::FromStr for PolicyConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ucb" => Ok(PolicyConfig::Ucb),
            "ts" | "thompson" => Ok(PolicyConfig::ThompsonSampling),
            other => Err(format!("unknown policy '{}', expected 'ucb' or 'ts'", other)),
        }
    }
}

/// Order arm indices by descending score, ties to the lowest arm index.
///
/// `scores` holds `(arm_index, score)` pairs; the result lists arm indices
/// from best (position 0) to worst.
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::policy::rank_arms;
///
/// let ranking = rank_arms(vec![(0, 0.4), (1, 0.9), (2, 0.9), (3, 0.1)]);
/// assert_eq!(ranking, vec![1, 2, 0, 3]);
/// ```
pub fn rank_arms(mut scores: Vec<(usize, f64)>) -> Vec<usize> {
    scores.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        ord => ord,
    });
    scores.into_iter().map(|(arm, _)| arm).collect()
}
