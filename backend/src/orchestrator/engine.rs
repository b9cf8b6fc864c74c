//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - User decisions (warm-up round-robin, then ranked index choice)
//! - Collision detection and rank re-randomization (rho_rand)
//! - Reward draws from the shared arm pool
//! - Per-round reward aggregation
//! - Event logging (complete simulation history)
//!
//! # Architecture
//!
//! ```text
//! For each round t:
//! 1. Collect decide(t) from every user (user-index order)
//! 2. Warm-up (t < n_arms): every user draws, collisions ignored,
//!    round total stays 0
//!    Steady state: count choices per arm
//!      - arm count > 1 → user collides: on_collision(), no draw
//!      - arm count == 1 → user draws, records the outcome, reward counted
//! 3. Append the round total to the reward series
//! 4. Advance time
//! ```
//!
//! All decisions are collected before any draw or rank update is applied.
//! Randomness is consumed in a fixed order within a round: decision samples,
//! then collision re-ranks, then Bernoulli draws, each in user-index order.
//!
//! # Example
//!
//! ```rust
//! use bandit_simulator_core_rs::orchestrator::{Orchestrator, SimulationConfig};
//! use bandit_simulator_core_rs::policy::PolicyConfig;
//!
//! let config = SimulationConfig {
//!     n_users: 2,
//!     n_arms: 3,
//!     t_horizon: 50,
//!     arm_means: vec![0.1, 0.5, 0.9],
//!     rng_seed: 12345,
//!     policy: PolicyConfig::Ucb,
//!     record_events: true,
//! };
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//!
//! let first = orchestrator.tick().unwrap();
//! assert_eq!(first.choices, vec![0, 0]);
//!
//! let rewards = orchestrator.run().unwrap();
//! assert_eq!(rewards.len(), 50);
//! ```

use crate::core::time::{Phase, TimeManager};
use crate::models::arm::{build_arms, Arm, RewardSource};
use crate::models::event::{Event, EventLog};
use crate::models::state::SimulationState;
use crate::models::user::{UserAgent, UserError};
use crate::policy::{IndexPolicy, PolicyConfig};
use crate::rng::{RandomSource, RngManager};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete simulation configuration
///
/// Missing fields fall back to `SimulationConfig::default()` when
/// deserialized, so partial config files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of secondary users
    pub n_users: usize,

    /// Number of arms; must be >= n_users
    pub n_arms: usize,

    /// Number of rounds to simulate
    pub t_horizon: usize,

    /// True success probability of each arm, each in (0, 1)
    pub arm_means: Vec<f64>,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Arm index policy shared by every user
    pub policy: PolicyConfig,

    /// Keep a full event log (disable for long runs)
    pub record_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_users: 3,
            n_arms: 5,
            t_horizon: 100,
            arm_means: vec![0.2, 0.3, 0.5, 0.8, 0.9],
            rng_seed: 42,
            policy: PolicyConfig::Ucb,
            record_events: true,
        }
    }
}

// ============================================================================
// Errors and Results
// ============================================================================

/// Simulation error types
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// Configuration rejected at setup
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Protocol invariant failed during a round
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] UserError),

    /// Every round of the horizon has already been played
    #[error("Simulation complete: all {horizon} rounds played")]
    SimulationComplete { horizon: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Checkpoint was produced under a different configuration
    #[error("Config mismatch: checkpoint hash {expected}, provided config hash {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("State validation error: {0}")]
    StateValidationError(String),
}

/// Result of a single round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    /// Round number
    pub round: usize,

    /// Phase the round was played in
    pub phase: Phase,

    /// Arm chosen by each user, indexed by user id
    pub choices: Vec<usize>,

    /// Users that collided (always empty during warm-up)
    pub colliding_users: Vec<usize>,

    /// Number of users that actually drew
    pub num_draws: usize,

    /// Total reward of clear-set draws this round (0 during warm-up)
    pub total_reward: f64,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator managing simulation state and the round loop
///
/// Owns the arm pool, every user, the reward series and the run's single
/// random source.
///
/// # Determinism
///
/// `Orchestrator::new` seeds an xorshift64* `RngManager` from
/// `config.rng_seed`; same seed + same config = identical results.
/// `Orchestrator::with_rng` accepts any `RandomSource`, which is how tests
/// substitute a scripted sequence.
pub struct Orchestrator<R: RandomSource = RngManager> {
    /// Configuration the run was built from
    config: SimulationConfig,

    /// Arm definitions (read-only)
    arms: Vec<Arm>,

    /// One reward source per arm, shared by all users
    reward_sources: Vec<RewardSource>,

    /// Users and reward series
    state: SimulationState,

    /// Round counter and phase tracking
    time_manager: TimeManager,

    /// Single random source for the run
    rng: R,

    /// Index policy shared by all users (stateless)
    policy: Box<dyn IndexPolicy>,

    /// Event log (all simulation events)
    event_log: EventLog,
}

impl Orchestrator<RngManager> {
    /// Create new orchestrator from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Successfully initialized orchestrator
    /// * `Err(SimulationError::InvalidConfig)` - Configuration validation failed
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let rng = RngManager::new(config.rng_seed);
        Self::with_rng(config, rng)
    }

    /// Save the current simulation state as a JSON checkpoint
    ///
    /// The checkpoint holds users, reward series, round position and RNG
    /// state. The event log is not included.
    pub fn save_state(&self) -> Result<String, SimulationError> {
        use crate::orchestrator::checkpoint::{
            compute_config_hash, validate_snapshot, StateSnapshot, UserSnapshot,
        };

        let config_hash = compute_config_hash(&self.config)?;

        let snapshot = StateSnapshot {
            current_round: self.time_manager.current_round(),
            rng_state: self.rng.get_state(),
            users: self.state.users().iter().map(UserSnapshot::from).collect(),
            round_rewards: self.state.round_rewards().to_vec(),
            config_hash,
        };

        // Validate invariants before serializing
        validate_snapshot(&snapshot, &self.config)?;

        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Failed to serialize state: {}", e))
        })
    }

    /// Load simulation state from JSON and create a new orchestrator
    ///
    /// Rejects checkpoints produced under a different config and snapshots
    /// that break the protocol invariants. The resumed run continues with
    /// exactly the rounds an uninterrupted run would have played.
    pub fn load_state(config: SimulationConfig, state_json: &str) -> Result<Self, SimulationError> {
        use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};

        let snapshot: StateSnapshot = serde_json::from_str(state_json).map_err(|e| {
            SimulationError::DeserializationError(format!("Failed to parse state JSON: {}", e))
        })?;

        Self::validate_config(&config)?;

        let config_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != config_hash {
            return Err(SimulationError::ConfigMismatch {
                expected: snapshot.config_hash,
                actual: config_hash,
            });
        }

        validate_snapshot(&snapshot, &config)?;

        let n_users = config.n_users;
        let users: Vec<UserAgent> = snapshot
            .users
            .into_iter()
            .map(|u| u.into_user(n_users))
            .collect();

        let state = SimulationState::from_parts(users, snapshot.round_rewards);
        let time_manager =
            TimeManager::resume_at(config.t_horizon, config.n_arms, snapshot.current_round);
        let rng = RngManager::new(snapshot.rng_state);

        info!(
            round = snapshot.current_round,
            horizon = config.t_horizon,
            "Restored simulation from checkpoint"
        );

        Self::assemble(config, state, time_manager, rng)
    }
}

impl<R: RandomSource> Orchestrator<R> {
    /// Create an orchestrator driven by an explicit random source
    ///
    /// Initial ranks are drawn from `rng` in user-index order.
    pub fn with_rng(config: SimulationConfig, mut rng: R) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let users: Vec<UserAgent> = (0..config.n_users)
            .map(|id| {
                let initial_rank = rng.index_below(config.n_users);
                UserAgent::new(id, config.n_arms, config.n_users, initial_rank)
            })
            .collect();

        let state = SimulationState::new(users);
        let time_manager = TimeManager::new(config.t_horizon, config.n_arms);

        info!(
            n_users = config.n_users,
            n_arms = config.n_arms,
            t_horizon = config.t_horizon,
            policy = ?config.policy,
            "Initialized simulation"
        );

        Self::assemble(config, state, time_manager, rng)
    }

    /// Build arms, reward sources and policy around prepared state
    fn assemble(
        config: SimulationConfig,
        state: SimulationState,
        time_manager: TimeManager,
        rng: R,
    ) -> Result<Self, SimulationError> {
        let arms = build_arms(&config.arm_means)
            .map_err(|e| SimulationError::InvalidConfig(e.to_string()))?;
        let reward_sources = arms.iter().copied().map(RewardSource::new).collect();
        let policy = config.policy.build();

        Ok(Self {
            config,
            arms,
            reward_sources,
            state,
            time_manager,
            rng,
            policy,
            event_log: EventLog::new(),
        })
    }

    /// Validate configuration
    ///
    /// Every check here runs before any round is played; nothing is
    /// re-validated at round time.
    pub fn validate_config(config: &SimulationConfig) -> Result<(), SimulationError> {
        if config.n_users == 0 {
            return Err(SimulationError::InvalidConfig(
                "n_users must be > 0".to_string(),
            ));
        }

        if config.t_horizon == 0 {
            return Err(SimulationError::InvalidConfig(
                "t_horizon must be > 0".to_string(),
            ));
        }

        if config.n_arms < config.n_users {
            return Err(SimulationError::InvalidConfig(format!(
                "n_arms ({}) must be >= n_users ({})",
                config.n_arms, config.n_users
            )));
        }

        if config.arm_means.len() != config.n_arms {
            return Err(SimulationError::InvalidConfig(format!(
                "expected {} arm means, got {}",
                config.n_arms,
                config.arm_means.len()
            )));
        }

        build_arms(&config.arm_means).map_err(|e| SimulationError::InvalidConfig(e.to_string()))?;

        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Index of the next round to play
    pub fn current_round(&self) -> usize {
        self.time_manager.current_round()
    }

    pub fn horizon(&self) -> usize {
        self.time_manager.horizon()
    }

    /// Phase of the next round to play
    pub fn phase(&self) -> Phase {
        self.time_manager.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.time_manager.is_finished()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable reference to state (for testing)
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn user(&self, id: usize) -> Option<&UserAgent> {
        self.state.get_user(id)
    }

    pub fn round_rewards(&self) -> &[f64] {
        self.state.round_rewards()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// The run's random source
    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    // ========================================================================
    // Round Loop
    // ========================================================================

    /// Play one round
    ///
    /// # Returns
    ///
    /// * `Ok(RoundResult)` - Round executed successfully
    /// * `Err(SimulationError::SimulationComplete)` - Horizon already reached
    /// * `Err(SimulationError::InvariantViolation)` - A user's ranking broke
    pub fn tick(&mut self) -> Result<RoundResult, SimulationError> {
        if self.time_manager.is_finished() {
            return Err(SimulationError::SimulationComplete {
                horizon: self.time_manager.horizon(),
            });
        }

        let round = self.time_manager.current_round();
        let phase = self.time_manager.phase();
        let n_arms = self.config.n_arms;

        if self.time_manager.is_warmup_boundary() {
            self.log_event(Event::WarmupComplete { round });
            debug!(round, "Warm-up complete, entering steady state");
        }

        // STEP 1: DECISIONS
        // Every choice is fixed before any draw or rank update
        let mut choices = Vec::with_capacity(self.state.num_users());
        for user in self.state.users_mut() {
            choices.push(user.decide(round, self.policy.as_ref(), &mut self.rng)?);
        }

        // STEP 2: COLLISION DETECTION
        // Warm-up tolerates overlap; steady state lets only sole choosers draw
        let mut choice_counts = vec![0usize; n_arms];
        for &arm in &choices {
            choice_counts[arm] += 1;
        }

        let colliding_users: Vec<usize> = match phase {
            Phase::Warmup => Vec::new(),
            Phase::SteadyState => choices
                .iter()
                .enumerate()
                .filter(|(_, &arm)| choice_counts[arm] > 1)
                .map(|(user_id, _)| user_id)
                .collect(),
        };

        if !colliding_users.is_empty() {
            self.resolve_collisions(round, &choices, &choice_counts, &colliding_users);
        }

        // STEP 3: DRAWS
        let mut total_reward = 0.0;
        let mut num_draws = 0;
        for (user_id, &arm) in choices.iter().enumerate() {
            let draws = match phase {
                Phase::Warmup => true,
                Phase::SteadyState => choice_counts[arm] == 1,
            };
            if !draws {
                continue;
            }

            let reward = self.reward_sources[arm].draw(&mut self.rng);
            self.state.users_mut()[user_id].record_outcome(arm, reward);
            num_draws += 1;

            // Warm-up draws only feed statistics; the round total counts
            // clear-set draws
            if phase == Phase::SteadyState {
                total_reward += f64::from(reward);
            }

            self.log_event(Event::Draw {
                round,
                user_id,
                arm,
                reward,
            });
        }

        // STEP 4: RECORD AND ADVANCE
        self.state.push_round_reward(total_reward);
        self.time_manager.advance_round();

        debug!(
            round,
            ?phase,
            num_draws,
            collisions = colliding_users.len(),
            total_reward,
            "Round complete"
        );

        Ok(RoundResult {
            round,
            phase,
            choices,
            colliding_users,
            num_draws,
            total_reward,
        })
    }

    /// Play every remaining round and return the full reward series
    pub fn run(&mut self) -> Result<Vec<f64>, SimulationError> {
        while !self.time_manager.is_finished() {
            self.tick()?;
        }

        info!(
            rounds = self.state.num_rounds(),
            total_reward = self.state.total_reward(),
            collisions = self.state.total_collisions(),
            policy = self.policy.name(),
            "Simulation finished"
        );

        Ok(self.state.round_rewards().to_vec())
    }

    /// Re-rank every colliding user, logging one `Collision` per contested arm
    fn resolve_collisions(
        &mut self,
        round: usize,
        choices: &[usize],
        choice_counts: &[usize],
        colliding_users: &[usize],
    ) {
        for (arm, _) in choice_counts.iter().enumerate().filter(|(_, &n)| n > 1) {
            let user_ids: Vec<usize> = choices
                .iter()
                .enumerate()
                .filter(|(_, &choice)| choice == arm)
                .map(|(user_id, _)| user_id)
                .collect();
            trace!(round, arm, ?user_ids, "Collision");
            self.log_event(Event::Collision {
                round,
                arm,
                user_ids,
            });
        }

        for &user_id in colliding_users {
            let user = &mut self.state.users_mut()[user_id];
            let old_rank = user.rank_to_consider();
            let new_rank = user.on_collision(&mut self.rng);
            self.log_event(Event::RankReassigned {
                round,
                user_id,
                old_rank,
                new_rank,
            });
        }
    }

    fn log_event(&mut self, event: Event) {
        if self.config.record_events {
            self.event_log.log(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    fn config(n_users: usize, arm_means: Vec<f64>, t_horizon: usize) -> SimulationConfig {
        SimulationConfig {
            n_users,
            n_arms: arm_means.len(),
            t_horizon,
            arm_means,
            rng_seed: 7,
            policy: PolicyConfig::Ucb,
            record_events: true,
        }
    }

    #[test]
    fn test_rejects_more_users_than_arms() {
        let err = Orchestrator::new(config(3, vec![0.2, 0.8], 10)).err();
        assert_eq!(
            err,
            Some(SimulationError::InvalidConfig(
                "n_arms (2) must be >= n_users (3)".to_string()
            ))
        );
    }

    #[test]
    fn test_rejects_zero_horizon_and_bad_means() {
        assert!(matches!(
            Orchestrator::new(config(1, vec![0.5], 0)),
            Err(SimulationError::InvalidConfig(_))
        ));
        assert!(matches!(
            Orchestrator::new(config(1, vec![0.5, 1.2], 5)),
            Err(SimulationError::InvalidConfig(_))
        ));

        let mut mismatched = config(1, vec![0.5, 0.6], 5);
        mismatched.n_arms = 3;
        assert!(matches!(
            Orchestrator::new(mismatched),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_pure_warmup_run_ignores_overlap() {
        // Horizon shorter than warm-up: every user draws, nothing is counted
        let rng = ScriptedRng::new(vec![0.0], vec![0]);
        let mut orch = Orchestrator::with_rng(config(3, vec![0.3, 0.6, 0.9], 1), rng).unwrap();

        let result = orch.tick().unwrap();
        assert_eq!(result.phase, Phase::Warmup);
        assert_eq!(result.choices, vec![0, 0, 0]);
        assert!(result.colliding_users.is_empty());
        assert_eq!(result.num_draws, 3);
        assert_eq!(result.total_reward, 0.0);
        assert!(orch.is_finished());

        for id in 0..3 {
            assert_eq!(orch.user(id).unwrap().reward_sum(0), 1);
        }
    }

    #[test]
    fn test_tick_after_horizon_errors() {
        let mut orch = Orchestrator::new(config(1, vec![0.5], 1)).unwrap();
        orch.run().unwrap();
        assert_eq!(
            orch.tick(),
            Err(SimulationError::SimulationComplete { horizon: 1 })
        );
    }

    #[test]
    fn test_event_recording_can_be_disabled() {
        let mut cfg = config(2, vec![0.2, 0.5, 0.8], 20);
        cfg.record_events = false;
        let mut orch = Orchestrator::new(cfg).unwrap();
        orch.run().unwrap();
        assert!(orch.event_log().is_empty());
    }
}
