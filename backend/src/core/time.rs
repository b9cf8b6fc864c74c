//! Time management for the simulation
//!
//! The simulation operates in discrete rounds `0..horizon`. The first
//! `warmup_rounds` rounds (one per arm) form the warm-up phase; every later
//! round is steady state. The transition is one-way.

use serde::{Deserialize, Serialize};

/// Protocol phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Round-robin exploration, collisions ignored (`round < n_arms`)
    Warmup,
    /// Index-ranked choice with collision resolution (`round >= n_arms`)
    SteadyState,
}

impl Phase {
    /// Phase of `round` for a pool of `n_arms` arms
    pub fn for_round(round: usize, n_arms: usize) -> Self {
        if round < n_arms {
            Phase::Warmup
        } else {
            Phase::SteadyState
        }
    }
}

/// Manages simulation time in discrete rounds
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::{Phase, TimeManager};
///
/// let mut time = TimeManager::new(10, 3); // 10 rounds, 3 warm-up rounds
/// assert_eq!(time.current_round(), 0);
/// assert_eq!(time.phase(), Phase::Warmup);
///
/// for _ in 0..3 {
///     time.advance_round();
/// }
/// assert_eq!(time.phase(), Phase::SteadyState);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    /// Rounds elapsed since simulation start
    current_round: usize,
    /// Total number of rounds in the run
    horizon: usize,
    /// Number of warm-up rounds (equals the number of arms)
    warmup_rounds: usize,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Panics
    /// Panics if `horizon` is zero
    pub fn new(horizon: usize, warmup_rounds: usize) -> Self {
        assert!(horizon > 0, "horizon must be positive");
        Self {
            current_round: 0,
            horizon,
            warmup_rounds,
        }
    }

    /// Resume at a given round (used when restoring checkpoints)
    pub fn resume_at(horizon: usize, warmup_rounds: usize, current_round: usize) -> Self {
        let mut time = Self::new(horizon, warmup_rounds);
        time.current_round = current_round.min(horizon);
        time
    }

    /// Advance time by one round
    pub fn advance_round(&mut self) {
        self.current_round += 1;
    }

    /// Current round index (rounds completed so far)
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    /// Total rounds in the run
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of warm-up rounds
    pub fn warmup_rounds(&self) -> usize {
        self.warmup_rounds
    }

    /// Phase of the current round
    pub fn phase(&self) -> Phase {
        Phase::for_round(self.current_round, self.warmup_rounds)
    }

    /// True when the current round is the first steady-state round
    pub fn is_warmup_boundary(&self) -> bool {
        self.current_round == self.warmup_rounds
    }

    /// True once every round of the horizon has been played
    pub fn is_finished(&self) -> bool {
        self.current_round >= self.horizon
    }

    /// Rounds left to play
    pub fn remaining_rounds(&self) -> usize {
        self.horizon.saturating_sub(self.current_round)
    }
}
