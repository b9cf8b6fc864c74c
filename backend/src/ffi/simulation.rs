//! PyO3 wrapper for the simulation orchestrator
//!
//! This module provides the Python interface consumed by plotting and
//! notebook code.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{parse_simulation_config, round_result_to_py, simulation_error_to_py};
use crate::orchestrator::Orchestrator;
use crate::regret::cumulative_regret;

/// Python wrapper for the Rust orchestrator
///
/// # Example (from Python)
///
/// ```python
/// from bandit_simulator_core_rs import Simulation
///
/// sim = Simulation({
///     "n_users": 3,
///     "t_horizon": 1000,
///     "arm_means": [0.2, 0.3, 0.5, 0.8, 0.9],
///     "rng_seed": 12345,
///     "policy": "ucb",
/// })
/// rewards = sim.run()
/// regret = sim.cumulative_regret()
/// ```
#[pyclass(name = "Simulation")]
pub struct PySimulation {
    inner: Orchestrator,
}

#[pymethods]
impl PySimulation {
    /// Create a new simulation from a configuration dict
    ///
    /// # Errors
    ///
    /// Raises ValueError if required fields are missing or the
    /// configuration is rejected (e.g. fewer arms than users).
    #[new]
    fn new(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let rust_config = parse_simulation_config(config)?;
        let inner = Orchestrator::new(rust_config).map_err(simulation_error_to_py)?;
        Ok(PySimulation { inner })
    }

    /// Restore a simulation from a checkpoint produced by `save_state`
    #[staticmethod]
    fn load_state(config: &Bound<'_, PyDict>, state_json: &str) -> PyResult<Self> {
        let rust_config = parse_simulation_config(config)?;
        let inner =
            Orchestrator::load_state(rust_config, state_json).map_err(simulation_error_to_py)?;
        Ok(PySimulation { inner })
    }

    /// Play one round
    ///
    /// Returns a dict with `round`, `phase`, `choices`, `colliding_users`,
    /// `num_draws` and `total_reward`.
    fn tick(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let result = self.inner.tick().map_err(simulation_error_to_py)?;
        round_result_to_py(py, &result)
    }

    /// Play all remaining rounds and return the full reward series
    fn run(&mut self) -> PyResult<Vec<f64>> {
        self.inner.run().map_err(simulation_error_to_py)
    }

    /// Index of the next round to play
    fn current_round(&self) -> usize {
        self.inner.current_round()
    }

    /// Per-round totals played so far
    fn round_rewards(&self) -> Vec<f64> {
        self.inner.round_rewards().to_vec()
    }

    /// Cumulative regret of the rounds played so far
    fn cumulative_regret(&self) -> Vec<f64> {
        let config = self.inner.config();
        cumulative_regret(&config.arm_means, config.n_users, self.inner.round_rewards())
    }

    /// Number of collisions each user has experienced
    fn collision_counts(&self) -> Vec<u64> {
        self.inner
            .state()
            .users()
            .iter()
            .map(|u| u.collision_count())
            .collect()
    }

    /// Serialize the current state to a JSON checkpoint string
    fn save_state(&self) -> PyResult<String> {
        self.inner.save_state().map_err(simulation_error_to_py)
    }
}

/// Run a full simulation and return per-round total rewards
#[pyfunction]
#[pyo3(name = "run_simulation")]
pub fn py_run_simulation(config: &Bound<'_, PyDict>) -> PyResult<Vec<f64>> {
    let rust_config = parse_simulation_config(config)?;
    crate::run_simulation(rust_config).map_err(simulation_error_to_py)
}

/// Cumulative regret of a reward series against the best `n_users` arms
#[pyfunction]
#[pyo3(name = "cumulative_regret")]
pub fn py_cumulative_regret(arm_means: Vec<f64>, n_users: usize, round_rewards: Vec<f64>) -> Vec<f64> {
    cumulative_regret(&arm_means, n_users, &round_rewards)
}
