//! Arm and reward source models
//!
//! An arm is a reward source with a fixed, hidden success probability.
//! Arms are immutable once created and shared read-only by every user.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when defining an arm
#[derive(Debug, Error, PartialEq)]
pub enum ArmError {
    #[error("Arm {index} mean {mean} must lie strictly inside (0, 1)")]
    MeanOutOfRange { index: usize, mean: f64 },
}

/// A Bernoulli arm identified by its index in the pool
///
/// # Example
/// ```
/// use bandit_simulator_core_rs::Arm;
///
/// let arm = Arm::new(2, 0.9).unwrap();
/// assert_eq!(arm.index(), 2);
/// assert!(Arm::new(0, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    index: usize,
    mean: f64,
}

impl Arm {
    /// Create an arm with success probability `mean ∈ (0, 1)`
    pub fn new(index: usize, mean: f64) -> Result<Self, ArmError> {
        if !(mean > 0.0 && mean < 1.0) {
            return Err(ArmError::MeanOutOfRange { index, mean });
        }
        Ok(Self { index, mean })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True success probability (hidden from users)
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

/// Stateless Bernoulli reward generator bound to one arm
///
/// Draws consume randomness from the caller's source and have no other
/// side effects, so one instance is shared by every user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSource {
    arm: Arm,
}

impl RewardSource {
    pub fn new(arm: Arm) -> Self {
        Self { arm }
    }

    pub fn arm(&self) -> &Arm {
        &self.arm
    }

    /// One independent Bernoulli(mean) trial: reward 0 or 1
    pub fn draw(&self, rng: &mut dyn RandomSource) -> u8 {
        rng.bernoulli(self.arm.mean)
    }
}

/// Build the arm pool from a list of means, indexed by position
pub fn build_arms(arm_means: &[f64]) -> Result<Vec<Arm>, ArmError> {
    arm_means
        .iter()
        .enumerate()
        .map(|(index, &mean)| Arm::new(index, mean))
        .collect()
}
