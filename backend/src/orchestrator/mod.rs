//! Orchestrator - main simulation loop
//!
//! Drives the round loop of the rho_rand protocol: decisions, collision
//! resolution, draws and reward aggregation.
//!
//! See `engine.rs` for full implementation.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{Orchestrator, RoundResult, SimulationConfig, SimulationError};

// Re-export checkpoint types
pub use checkpoint::{StateSnapshot, UserSnapshot};
