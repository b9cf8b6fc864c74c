//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete orchestrator state
//! for pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: Resuming from a checkpoint replays the same remaining rounds
//! - **Reward Conservation**: Users' reward sums equal the round totals plus
//!   at most one warm-up reward per user per warm-up round
//! - **User Integrity**: `draws == 0 ⇒ reward == 0`, ranks inside `[0, n_users)`
//! - **Config Matching**: State can only be loaded with matching config

use crate::models::user::UserAgent;
use crate::orchestrator::engine::{SimulationConfig, SimulationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete orchestrator state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Next round to play
    pub current_round: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// All user states, in user-index order
    pub users: Vec<UserSnapshot>,

    /// Totals of the rounds already played
    pub round_rewards: Vec<f64>,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,
}

/// User state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: usize,
    pub reward_sums: Vec<u64>,
    pub draw_counts: Vec<u64>,
    pub rank_to_consider: usize,
    pub current_arm_choice: Option<usize>,
    pub collision_count: u64,
}

impl From<&UserAgent> for UserSnapshot {
    fn from(user: &UserAgent) -> Self {
        UserSnapshot {
            id: user.id(),
            reward_sums: user.reward_sums().to_vec(),
            draw_counts: user.draw_counts().to_vec(),
            rank_to_consider: user.rank_to_consider(),
            current_arm_choice: user.current_arm_choice(),
            collision_count: user.collision_count(),
        }
    }
}

impl UserSnapshot {
    /// Rebuild the user for a pool of `n_users`
    pub fn into_user(self, n_users: usize) -> UserAgent {
        UserAgent::from_snapshot(
            self.id,
            n_users,
            self.reward_sums,
            self.draw_counts,
            self.rank_to_consider,
            self.current_arm_choice,
            self.collision_count,
        )
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Config fields that never change the simulated trajectory
const UNHASHED_FIELDS: &[&str] = &["record_events"];

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field declaration order. Observability switches are left out,
/// so a run saved without events can resume with them on.
pub fn compute_config_hash(config: &SimulationConfig) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let mut value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;
    if let Value::Object(map) = &mut value {
        for field in UNHASHED_FIELDS {
            map.remove(*field);
        }
    }

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate state snapshot integrity against the run's config
///
/// Checks:
/// - Round position and reward series agree and fit the horizon
/// - Every user has per-arm vectors of the right length
/// - `reward_sum <= draw_count` per arm (so undrawn arms carry no reward)
/// - Ranks and last choices are in range
/// - Reward conservation between users and round totals
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    config: &SimulationConfig,
) -> Result<(), SimulationError> {
    let invalid = |msg: String| Err(SimulationError::StateValidationError(msg));

    // 1. Round position
    if snapshot.current_round > config.t_horizon {
        return invalid(format!(
            "current_round {} exceeds horizon {}",
            snapshot.current_round, config.t_horizon
        ));
    }
    if snapshot.round_rewards.len() != snapshot.current_round {
        return invalid(format!(
            "{} round rewards recorded for {} completed rounds",
            snapshot.round_rewards.len(),
            snapshot.current_round
        ));
    }
    let max_round_reward = config.n_users as f64;
    if let Some(bad) = snapshot
        .round_rewards
        .iter()
        .find(|r| !(r.is_finite() && **r >= 0.0 && **r <= max_round_reward))
    {
        return invalid(format!(
            "round reward {} outside [0, {}]",
            bad, max_round_reward
        ));
    }

    // 2. User integrity
    if snapshot.users.len() != config.n_users {
        return invalid(format!(
            "expected {} users, found {}",
            config.n_users,
            snapshot.users.len()
        ));
    }

    for (index, user) in snapshot.users.iter().enumerate() {
        if user.id != index {
            return invalid(format!("user at position {} has id {}", index, user.id));
        }
        if user.reward_sums.len() != config.n_arms || user.draw_counts.len() != config.n_arms {
            return invalid(format!(
                "user {} has statistics for {}/{} arms, expected {}",
                user.id,
                user.reward_sums.len(),
                user.draw_counts.len(),
                config.n_arms
            ));
        }
        for (arm, (reward, draws)) in user.reward_sums.iter().zip(&user.draw_counts).enumerate() {
            if reward > draws {
                return invalid(format!(
                    "user {} arm {}: reward sum {} exceeds draw count {}",
                    user.id, arm, reward, draws
                ));
            }
        }
        if user.rank_to_consider >= config.n_users {
            return invalid(format!(
                "user {} rank {} outside [0, {})",
                user.id, user.rank_to_consider, config.n_users
            ));
        }
        if let Some(arm) = user.current_arm_choice {
            if arm >= config.n_arms {
                return invalid(format!("user {} last choice {} is not an arm", user.id, arm));
            }
        }
    }

    // 3. Reward conservation
    // Warm-up draws reach user statistics but never the round series, so
    // users may hold up to one extra reward per user per warm-up round.
    let warmup_rounds = snapshot.current_round.min(config.n_arms);
    if let Some(round) = snapshot.round_rewards[..warmup_rounds]
        .iter()
        .position(|r| *r != 0.0)
    {
        return invalid(format!(
            "warm-up round {} has non-zero total {}",
            round, snapshot.round_rewards[round]
        ));
    }

    let user_rewards: u64 = snapshot
        .users
        .iter()
        .flat_map(|u| u.reward_sums.iter())
        .sum();
    let series_rewards: f64 = snapshot.round_rewards.iter().sum();
    let warmup_allowance = (config.n_users * warmup_rounds) as f64;
    let unexplained = user_rewards as f64 - series_rewards;
    if unexplained < -1e-9 || unexplained > warmup_allowance + 1e-9 {
        return invalid(format!(
            "reward conservation violated: users hold {}, round totals sum to {} \
             with at most {} from warm-up",
            user_rewards, series_rewards, warmup_allowance
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_config_hash_deterministic() {
        let hash1 = compute_config_hash(&SimulationConfig::default()).unwrap();
        let hash2 = compute_config_hash(&SimulationConfig::default()).unwrap();
        assert_eq!(hash1, hash2, "Same config should produce same hash");
    }

    #[test]
    fn test_compute_config_hash_different_for_different_configs() {
        let config1 = SimulationConfig::default();
        let config2 = SimulationConfig {
            rng_seed: 43,
            ..SimulationConfig::default()
        };

        assert_ne!(
            compute_config_hash(&config1).unwrap(),
            compute_config_hash(&config2).unwrap(),
            "Different configs should produce different hashes"
        );
    }

    #[test]
    fn test_compute_config_hash_ignores_record_events() {
        let quiet = SimulationConfig {
            record_events: false,
            ..SimulationConfig::default()
        };
        let verbose = SimulationConfig {
            record_events: true,
            ..SimulationConfig::default()
        };

        assert_eq!(
            compute_config_hash(&quiet).unwrap(),
            compute_config_hash(&verbose).unwrap()
        );
    }

    fn empty_snapshot(config: &SimulationConfig) -> StateSnapshot {
        StateSnapshot {
            current_round: 0,
            rng_state: 1,
            users: (0..config.n_users)
                .map(|id| UserSnapshot {
                    id,
                    reward_sums: vec![0; config.n_arms],
                    draw_counts: vec![0; config.n_arms],
                    rank_to_consider: 0,
                    current_arm_choice: None,
                    collision_count: 0,
                })
                .collect(),
            round_rewards: Vec::new(),
            config_hash: String::new(),
        }
    }

    #[test]
    fn test_validate_accepts_fresh_snapshot() {
        let config = SimulationConfig::default();
        assert!(validate_snapshot(&empty_snapshot(&config), &config).is_ok());
    }

    #[test]
    fn test_validate_rejects_reward_without_draw() {
        let config = SimulationConfig::default();
        let mut snapshot = empty_snapshot(&config);
        snapshot.users[1].reward_sums[2] = 1;
        snapshot.current_round = 1;
        snapshot.round_rewards = vec![0.0];

        assert!(matches!(
            validate_snapshot(&snapshot, &config),
            Err(SimulationError::StateValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_reward_conservation_break() {
        let config = SimulationConfig::default();
        let mut snapshot = empty_snapshot(&config);
        snapshot.current_round = 6;
        snapshot.round_rewards = vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0];

        let err = validate_snapshot(&snapshot, &config).unwrap_err();
        assert!(err.to_string().contains("reward conservation"));
    }

    #[test]
    fn test_validate_rejects_counted_warmup_round() {
        let config = SimulationConfig::default();
        let mut snapshot = empty_snapshot(&config);
        snapshot.users[0].reward_sums[0] = 1;
        snapshot.users[0].draw_counts[0] = 1;
        snapshot.current_round = 1;
        snapshot.round_rewards = vec![1.0];

        let err = validate_snapshot(&snapshot, &config).unwrap_err();
        assert!(err.to_string().contains("warm-up round 0"));
    }

    #[test]
    fn test_validate_accepts_uncounted_warmup_rewards() {
        let config = SimulationConfig::default();
        let mut snapshot = empty_snapshot(&config);
        for user in &mut snapshot.users {
            user.reward_sums[0] = 1;
            user.draw_counts[0] = 1;
        }
        snapshot.current_round = 1;
        snapshot.round_rewards = vec![0.0];

        assert!(validate_snapshot(&snapshot, &config).is_ok());
    }
}
