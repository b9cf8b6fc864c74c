//! Regret accounting
//!
//! The best any set of `n_users` users can do in one round is to occupy the
//! `n_users` best arms without colliding, so the per-round benchmark is the
//! sum of the `n_users` highest means. Regret accumulates the shortfall of
//! each round's actual total against that benchmark.

use serde::Serialize;

/// Sum of the `n_users` highest arm means
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::regret::best_achievable_reward;
///
/// let best = best_achievable_reward(&[0.2, 0.3, 0.5, 0.8, 0.9], 3);
/// assert!((best - 2.2).abs() < 1e-12);
/// ```
pub fn best_achievable_reward(arm_means: &[f64], n_users: usize) -> f64 {
    let mut sorted = arm_means.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.iter().take(n_users).sum()
}

/// Cumulative regret after each round: `cumsum(best - reward[t])`
pub fn cumulative_regret(arm_means: &[f64], n_users: usize, round_rewards: &[f64]) -> Vec<f64> {
    let best = best_achievable_reward(arm_means, n_users);
    round_rewards
        .iter()
        .scan(0.0, |acc, reward| {
            *acc += best - reward;
            Some(*acc)
        })
        .collect()
}

/// Reward and regret series of a finished run, ready for plotting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegretReport {
    pub n_users: usize,
    pub best_achievable_reward: f64,
    pub round_rewards: Vec<f64>,
    pub cumulative_reward: Vec<f64>,
    pub cumulative_regret: Vec<f64>,
}

impl RegretReport {
    pub fn new(arm_means: &[f64], n_users: usize, round_rewards: &[f64]) -> Self {
        let cumulative_reward = round_rewards
            .iter()
            .scan(0.0, |acc, reward| {
                *acc += reward;
                Some(*acc)
            })
            .collect();

        Self {
            n_users,
            best_achievable_reward: best_achievable_reward(arm_means, n_users),
            round_rewards: round_rewards.to_vec(),
            cumulative_reward,
            cumulative_regret: cumulative_regret(arm_means, n_users, round_rewards),
        }
    }

    /// Regret after the last round (0 for an empty run)
    pub fn final_regret(&self) -> f64 {
        self.cumulative_regret.last().copied().unwrap_or(0.0)
    }

    /// Total reward over the run
    pub fn total_reward(&self) -> f64 {
        self.cumulative_reward.last().copied().unwrap_or(0.0)
    }
}
