//! Domain models for the bandit simulator

pub mod arm;
pub mod event;
pub mod state;
pub mod user;

// Re-exports
pub use arm::{build_arms, Arm, ArmError, RewardSource};
pub use event::{Event, EventLog};
pub use state::SimulationState;
pub use user::{UserAgent, UserError};
