//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, lists).

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::time::Phase;
use crate::orchestrator::{RoundResult, SimulationConfig, SimulationError};
use crate::policy::PolicyConfig;

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with clear error messages.
///
/// # Errors
/// Returns PyValueError if the field is missing; conversion errors propagate.
fn extract_required<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract a field with a default value if missing.
fn extract_with_default<'py, T>(dict: &Bound<'py, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert Python dict to SimulationConfig
///
/// `arm_means` is required. `n_arms` defaults to `len(arm_means)`; every
/// other field falls back to `SimulationConfig::default()`. Range checks
/// are left to `Orchestrator::validate_config`.
pub fn parse_simulation_config(py_config: &Bound<'_, PyDict>) -> PyResult<SimulationConfig> {
    let defaults = SimulationConfig::default();

    let arm_means: Vec<f64> = extract_required(py_config, "arm_means")?;
    let n_arms: usize = extract_with_default(py_config, "n_arms", arm_means.len())?;
    let n_users: usize = extract_with_default(py_config, "n_users", defaults.n_users)?;
    let t_horizon: usize = extract_with_default(py_config, "t_horizon", defaults.t_horizon)?;
    let rng_seed: u64 = extract_with_default(py_config, "rng_seed", defaults.rng_seed)?;
    let record_events: bool =
        extract_with_default(py_config, "record_events", defaults.record_events)?;

    let policy_name: String = extract_with_default(py_config, "policy", "ucb".to_string())?;
    let policy: PolicyConfig = policy_name.parse().map_err(PyValueError::new_err)?;

    Ok(SimulationConfig {
        n_users,
        n_arms,
        t_horizon,
        arm_means,
        rng_seed,
        policy,
        record_events,
    })
}

/// Map engine errors onto Python exceptions
///
/// Configuration problems raise ValueError; everything else RuntimeError.
pub fn simulation_error_to_py(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidConfig(_) | SimulationError::ConfigMismatch { .. } => {
            PyValueError::new_err(err.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Convert RoundResult to Python dict
pub fn round_result_to_py(py: Python, result: &RoundResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("round", result.round)?;
    dict.set_item(
        "phase",
        match result.phase {
            Phase::Warmup => "warmup",
            Phase::SteadyState => "steady_state",
        },
    )?;
    dict.set_item("choices", result.choices.clone())?;
    dict.set_item("colliding_users", result.colliding_users.clone())?;
    dict.set_item("num_draws", result.num_draws)?;
    dict.set_item("total_reward", result.total_reward)?;

    Ok(dict.into())
}
