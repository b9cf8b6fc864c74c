//! Bandit Simulator Core - Rust Engine
//!
//! Decentralized multi-armed bandit simulator with deterministic execution.
//! Several secondary users share a pool of Bernoulli arms without any
//! communication and resolve collisions with the rho_rand protocol.
//!
//! # Architecture
//!
//! - **core**: Round counting and warm-up/steady-state phases
//! - **models**: Domain types (Arm, RewardSource, UserAgent, State, Events)
//! - **policy**: Arm index policies (UCB, Thompson sampling) and ranking
//! - **orchestrator**: Main simulation loop and checkpoints
//! - **regret**: Benchmark reward and cumulative regret
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (one seeded RNG per run)
//! 2. Users never observe each other's statistics or choices
//! 3. `n_arms >= n_users`, checked at setup
//! 4. Every round total lies in `[0, n_users]`

// Module declarations
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod regret;
pub mod rng;

// Re-exports for convenience
pub use crate::core::time::{Phase, TimeManager};
pub use models::{
    arm::{Arm, ArmError, RewardSource},
    event::{Event, EventLog},
    state::SimulationState,
    user::{UserAgent, UserError},
};
pub use orchestrator::{Orchestrator, RoundResult, SimulationConfig, SimulationError};
pub use policy::{IndexPolicy, PolicyConfig, ThompsonSamplingPolicy, UcbPolicy};
pub use regret::{best_achievable_reward, cumulative_regret, RegretReport};
pub use rng::{RandomSource, RngManager};

/// Run a complete simulation and return the total reward of every round
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::{run_simulation, SimulationConfig};
///
/// let rewards = run_simulation(SimulationConfig::default()).unwrap();
/// assert_eq!(rewards.len(), 100);
/// assert!(rewards.iter().all(|&r| r <= 3.0));
/// ```
pub fn run_simulation(config: SimulationConfig) -> Result<Vec<f64>, SimulationError> {
    Orchestrator::new(config)?.run()
}

/// Plain-parameter form of [`run_simulation`]
///
/// `n_arms` must equal `arm_means.len()`; the event log is not kept.
pub fn run_simulation_with(
    n_users: usize,
    n_arms: usize,
    t_horizon: usize,
    arm_means: &[f64],
    rng_seed: u64,
    policy: PolicyConfig,
) -> Result<Vec<f64>, SimulationError> {
    run_simulation(SimulationConfig {
        n_users,
        n_arms,
        t_horizon,
        arm_means: arm_means.to_vec(),
        rng_seed,
        policy,
        record_events: false,
    })
}

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn bandit_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulation::PySimulation>()?;
    m.add_function(wrap_pyfunction!(ffi::simulation::py_run_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::simulation::py_cumulative_regret, m)?)?;
    Ok(())
}
