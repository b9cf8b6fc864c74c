//! Simulation State
//!
//! Represents the complete mutable state of a bandit simulation run:
//! every secondary user and the per-round reward series.
//!
//! # Critical Invariants
//!
//! 1. **Write Once**: each round appends exactly one total to `round_rewards`
//! 2. **Aggregate Bound**: every round total lies in `[0, n_users]`
//! 3. **Identity**: `users[i].id() == i`

use crate::models::user::UserAgent;

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use bandit_simulator_core_rs::{SimulationState, UserAgent};
///
/// let users = vec![UserAgent::new(0, 3, 2, 0), UserAgent::new(1, 3, 2, 1)];
/// let mut state = SimulationState::new(users);
/// assert_eq!(state.num_users(), 2);
///
/// state.push_round_reward(1.0);
/// state.push_round_reward(2.0);
/// assert_eq!(state.total_reward(), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// All users, indexed by user id
    users: Vec<UserAgent>,

    /// Total reward obtained in each completed round
    round_rewards: Vec<f64>,
}

impl SimulationState {
    /// Create a new simulation state with given users
    pub fn new(users: Vec<UserAgent>) -> Self {
        Self {
            users,
            round_rewards: Vec::new(),
        }
    }

    /// Rebuild state from checkpointed parts
    pub fn from_parts(users: Vec<UserAgent>, round_rewards: Vec<f64>) -> Self {
        Self {
            users,
            round_rewards,
        }
    }

    /// Get reference to a user by id
    pub fn get_user(&self, id: usize) -> Option<&UserAgent> {
        self.users.get(id)
    }

    /// Get mutable reference to a user by id
    pub fn get_user_mut(&mut self, id: usize) -> Option<&mut UserAgent> {
        self.users.get_mut(id)
    }

    pub fn users(&self) -> &[UserAgent] {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut [UserAgent] {
        &mut self.users
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Append the total reward of the round just played
    pub fn push_round_reward(&mut self, reward: f64) {
        self.round_rewards.push(reward);
    }

    /// Per-round totals in round order
    pub fn round_rewards(&self) -> &[f64] {
        &self.round_rewards
    }

    /// Number of completed rounds
    pub fn num_rounds(&self) -> usize {
        self.round_rewards.len()
    }

    /// Sum of all round totals
    pub fn total_reward(&self) -> f64 {
        self.round_rewards.iter().sum()
    }

    /// Total collisions experienced across users
    pub fn total_collisions(&self) -> u64 {
        self.users.iter().map(|u| u.collision_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(vec![UserAgent::new(0, 2, 1, 0)]);
        assert_eq!(state.num_users(), 1);
        assert_eq!(state.num_rounds(), 0);
        assert_eq!(state.total_reward(), 0.0);
    }

    #[test]
    fn test_user_lookup_by_id() {
        let mut state = SimulationState::new(vec![UserAgent::new(0, 2, 2, 0), UserAgent::new(1, 2, 2, 1)]);
        assert_eq!(state.get_user(1).map(|u| u.rank_to_consider()), Some(1));
        assert!(state.get_user(2).is_none());

        state.get_user_mut(0).unwrap().record_outcome(1, 1);
        assert_eq!(state.get_user(0).unwrap().draw_count(1), 1);
    }
}
