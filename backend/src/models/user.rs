//! Secondary user model
//!
//! Represents one independent decision maker competing for arms.
//! Each user has:
//! - Private per-arm statistics (reward sums, draw counts)
//! - A private target rank into its own arm ranking
//!
//! # Decision State Machine
//!
//! ```text
//! Warmup (round < n_arms)  ──round == n_arms──▶  SteadyState
//!   decide = round mod n_arms                      decide = ranking[rank_to_consider]
//!                                                  then Draw (record_outcome)
//!                                                    or Collide (on_collision)
//! ```
//!
//! Users never see each other's statistics or choices. The only coordination
//! device is `on_collision`, which re-draws the target rank uniformly.
//!
//! # Critical Invariants
//!
//! 1. `draw_counts[a] == 0 ⇒ reward_sums[a] == 0`
//! 2. `rank_to_consider ∈ [0, n_users)`
//! 3. `n_arms >= n_users` (checked by the orchestrator at setup)

use crate::core::time::Phase;
use crate::policy::{rank_arms, ArmStats, IndexPolicy};
use crate::rng::RandomSource;
use thiserror::Error;

/// Protocol invariant failures raised while deciding
#[derive(Debug, Error, PartialEq)]
pub enum UserError {
    #[error("User {user_id}: rank_to_consider {rank} outside [0, {n_users})")]
    RankOutOfRange {
        user_id: usize,
        rank: usize,
        n_users: usize,
    },

    #[error("User {user_id}: ranking position {position} selects an undrawn arm ({ranked_arms} arms drawn)")]
    UndrawnArm {
        user_id: usize,
        position: usize,
        ranked_arms: usize,
    },
}

/// One secondary user and its private learning state
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::{UcbPolicy, UserAgent};
/// use bandit_simulator_core_rs::rng::RngManager;
///
/// let mut rng = RngManager::new(1);
/// let mut user = UserAgent::new(0, 3, 2, 0);
///
/// // Warm-up is round-robin regardless of rank
/// assert_eq!(user.decide(1, &UcbPolicy, &mut rng).unwrap(), 1);
///
/// user.record_outcome(1, 1);
/// assert_eq!(user.draw_count(1), 1);
/// assert_eq!(user.reward_sum(1), 1);
/// ```
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// User index in `0..n_users`
    id: usize,

    /// Number of users sharing the pool (bounds `rank_to_consider`)
    n_users: usize,

    /// Cumulative reward observed per arm
    reward_sums: Vec<u64>,

    /// Number of draws per arm
    draw_counts: Vec<u64>,

    /// Target position in this user's own descending ranking
    rank_to_consider: usize,

    /// Arm chosen in the most recent `decide`
    current_arm_choice: Option<usize>,

    /// Rounds in which this user collided (diagnostic only)
    collision_count: u64,

    /// Ranking computed for a round, reused until statistics change
    ranking_cache: Option<(usize, Vec<usize>)>,
}

impl UserAgent {
    /// Create a user with empty statistics and an initial target rank
    ///
    /// # Panics
    /// Panics if `initial_rank >= n_users`
    pub fn new(id: usize, n_arms: usize, n_users: usize, initial_rank: usize) -> Self {
        assert!(
            initial_rank < n_users,
            "initial rank must lie in [0, n_users)"
        );
        Self {
            id,
            n_users,
            reward_sums: vec![0; n_arms],
            draw_counts: vec![0; n_arms],
            rank_to_consider: initial_rank,
            current_arm_choice: None,
            collision_count: 0,
            ranking_cache: None,
        }
    }

    /// Rebuild a user from checkpointed fields
    ///
    /// Field consistency is checked by checkpoint validation, not here.
    pub fn from_snapshot(
        id: usize,
        n_users: usize,
        reward_sums: Vec<u64>,
        draw_counts: Vec<u64>,
        rank_to_consider: usize,
        current_arm_choice: Option<usize>,
        collision_count: u64,
    ) -> Self {
        Self {
            id,
            n_users,
            reward_sums,
            draw_counts,
            rank_to_consider,
            current_arm_choice,
            collision_count,
            ranking_cache: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn n_arms(&self) -> usize {
        self.draw_counts.len()
    }

    pub fn n_users(&self) -> usize {
        self.n_users
    }

    pub fn rank_to_consider(&self) -> usize {
        self.rank_to_consider
    }

    pub fn current_arm_choice(&self) -> Option<usize> {
        self.current_arm_choice
    }

    pub fn collision_count(&self) -> u64 {
        self.collision_count
    }

    pub fn reward_sums(&self) -> &[u64] {
        &self.reward_sums
    }

    pub fn draw_counts(&self) -> &[u64] {
        &self.draw_counts
    }

    pub fn reward_sum(&self, arm: usize) -> u64 {
        self.reward_sums[arm]
    }

    pub fn draw_count(&self, arm: usize) -> u64 {
        self.draw_counts[arm]
    }

    /// Total draws across all arms
    pub fn total_draws(&self) -> u64 {
        self.draw_counts.iter().sum()
    }

    /// Statistics this user holds for `arm`
    pub fn arm_stats(&self, arm: usize) -> ArmStats {
        ArmStats {
            reward_sum: self.reward_sums[arm],
            draws: self.draw_counts[arm],
        }
    }

    /// Overwrite the target rank (test setup and scenario forcing)
    ///
    /// # Panics
    /// Panics if `rank >= n_users`
    pub fn set_rank_to_consider(&mut self, rank: usize) {
        assert!(rank < self.n_users, "rank must lie in [0, n_users)");
        self.rank_to_consider = rank;
    }

    // ========================================================================
    // Protocol
    // ========================================================================

    /// Choose the arm to play at `round`.
    ///
    /// Warm-up rounds return `round mod n_arms`. Steady-state rounds rank
    /// drawn arms by the policy index and return the arm at
    /// `rank_to_consider`. Calling twice for the same round without an
    /// intervening `record_outcome`/`on_collision` returns the same arm.
    pub fn decide(
        &mut self,
        round: usize,
        policy: &dyn IndexPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<usize, UserError> {
        let n_arms = self.n_arms();
        let user_id = self.id;

        let choice = match Phase::for_round(round, n_arms) {
            Phase::Warmup => round % n_arms,
            Phase::SteadyState => {
                if self.rank_to_consider >= self.n_users {
                    return Err(UserError::RankOutOfRange {
                        user_id,
                        rank: self.rank_to_consider,
                        n_users: self.n_users,
                    });
                }
                let position = self.rank_to_consider % self.n_users;

                let ranking = self.ranking(round, policy, rng);
                match ranking.get(position) {
                    Some(&arm) => arm,
                    None => {
                        return Err(UserError::UndrawnArm {
                            user_id,
                            position,
                            ranked_arms: ranking.len(),
                        })
                    }
                }
            }
        };

        self.current_arm_choice = Some(choice);
        Ok(choice)
    }

    /// Record an actual draw of `arm` yielding `reward`
    pub fn record_outcome(&mut self, arm: usize, reward: u8) {
        self.draw_counts[arm] += 1;
        self.reward_sums[arm] += u64::from(reward);
        self.ranking_cache = None;
    }

    /// React to a collision: redraw the target rank uniformly from
    /// `[0, n_users)`. Returns the new rank.
    pub fn on_collision(&mut self, rng: &mut dyn RandomSource) -> usize {
        self.rank_to_consider = rng.index_below(self.n_users);
        self.collision_count += 1;
        self.ranking_cache = None;
        self.rank_to_consider
    }

    /// Descending index ranking over drawn arms for `round`
    fn ranking(
        &mut self,
        round: usize,
        policy: &dyn IndexPolicy,
        rng: &mut dyn RandomSource,
    ) -> &[usize] {
        let fresh = !matches!(&self.ranking_cache, Some((cached_round, _)) if *cached_round == round);
        if fresh {
            let scores: Vec<(usize, f64)> = (0..self.n_arms())
                .filter(|&arm| self.draw_counts[arm] > 0)
                .map(|arm| (arm, policy.arm_index(self.arm_stats(arm), round, rng)))
                .collect();
            self.ranking_cache = Some((round, rank_arms(scores)));
        }

        match &self.ranking_cache {
            Some((_, ranking)) => ranking,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ThompsonSamplingPolicy, UcbPolicy};
    use crate::rng::{RngManager, ScriptedRng};

    fn warmed_up_user(rewards: &[u8], n_users: usize, rank: usize) -> UserAgent {
        let mut user = UserAgent::new(0, rewards.len(), n_users, rank);
        for (arm, &reward) in rewards.iter().enumerate() {
            user.record_outcome(arm, reward);
        }
        user
    }

    #[test]
    fn test_warmup_is_round_robin() {
        let mut rng = RngManager::new(3);
        let mut user = UserAgent::new(1, 4, 2, 1);
        for round in 0..4 {
            assert_eq!(user.decide(round, &UcbPolicy, &mut rng).unwrap(), round % 4);
        }
    }

    #[test]
    fn test_steady_state_selects_rank_position() {
        let mut rng = RngManager::new(3);
        // Arm 2 paid, arms 0 and 1 did not: ranking [2, 0, 1]
        let mut best = warmed_up_user(&[0, 0, 1], 2, 0);
        let mut second = warmed_up_user(&[0, 0, 1], 2, 1);

        assert_eq!(best.decide(3, &UcbPolicy, &mut rng).unwrap(), 2);
        assert_eq!(second.decide(3, &UcbPolicy, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_undrawn_arm_is_invariant_violation() {
        let mut rng = RngManager::new(3);
        let mut user = UserAgent::new(4, 3, 2, 1);
        user.record_outcome(0, 1);

        let err = user.decide(3, &UcbPolicy, &mut rng).unwrap_err();
        assert_eq!(
            err,
            UserError::UndrawnArm {
                user_id: 4,
                position: 1,
                ranked_arms: 1
            }
        );
    }

    #[test]
    fn test_rank_out_of_range_is_invariant_violation() {
        let mut rng = RngManager::new(3);
        let mut user = UserAgent::from_snapshot(0, 2, vec![1, 1, 1], vec![1, 1, 1], 5, None, 0);
        assert!(matches!(
            user.decide(3, &UcbPolicy, &mut rng),
            Err(UserError::RankOutOfRange { rank: 5, .. })
        ));
    }

    #[test]
    fn test_thompson_decision_is_idempotent_within_round() {
        let mut rng = RngManager::new(17);
        let mut user = warmed_up_user(&[1, 0, 1, 0, 1], 3, 1);

        let first = user.decide(7, &ThompsonSamplingPolicy, &mut rng).unwrap();
        for _ in 0..10 {
            assert_eq!(user.decide(7, &ThompsonSamplingPolicy, &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn test_on_collision_redraws_rank() {
        let mut rng = ScriptedRng::new(vec![0.5], vec![2]);
        let mut user = UserAgent::new(0, 3, 3, 0);
        assert_eq!(user.on_collision(&mut rng), 2);
        assert_eq!(user.rank_to_consider(), 2);
        assert_eq!(user.collision_count(), 1);
    }
}
