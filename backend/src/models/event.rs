//! Event logging for simulation replay and auditing.
//!
//! This module defines the Event enum which captures every state change the
//! protocol makes during a run. Events enable:
//! - Debugging (which users collided on which arm, and when)
//! - Auditing (every reward credited to a user is a `Draw`)
//! - Analysis (collision frequency, rank churn, convergence round)
//!
//! # Event Types
//!
//! - **Draw**: a user drew an arm and observed a reward
//! - **Collision**: two or more users chose the same arm in a steady-state round
//! - **RankReassigned**: a colliding user redrew its target rank
//! - **WarmupComplete**: the first steady-state round begins
//!
//! # Example
//!
//! ```rust
//! use bandit_simulator_core_rs::models::Event;
//!
//! let event = Event::Collision {
//!     round: 12,
//!     arm: 4,
//!     user_ids: vec![0, 2],
//! };
//!
//! assert_eq!(event.round(), 12);
//! assert_eq!(event.event_type(), "Collision");
//! ```

use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// Events are logged in the order they occur within a round: collisions and
/// rank reassignments first, then draws in user order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// User drew an arm (no collision, or warm-up round)
    Draw {
        round: usize,
        user_id: usize,
        arm: usize,
        reward: u8,
    },

    /// Users that chose the same arm in a steady-state round
    Collision {
        round: usize,
        arm: usize,
        user_ids: Vec<usize>,
    },

    /// Colliding user redrew its target rank
    RankReassigned {
        round: usize,
        user_id: usize,
        old_rank: usize,
        new_rank: usize,
    },

    /// First steady-state round is about to be played
    WarmupComplete { round: usize },
}

impl Event {
    /// Get the round number when this event occurred
    pub fn round(&self) -> usize {
        match self {
            Event::Draw { round, .. } => *round,
            Event::Collision { round, .. } => *round,
            Event::RankReassigned { round, .. } => *round,
            Event::WarmupComplete { round } => *round,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Draw { .. } => "Draw",
            Event::Collision { .. } => "Collision",
            Event::RankReassigned { .. } => "RankReassigned",
            Event::WarmupComplete { .. } => "WarmupComplete",
        }
    }

    /// True if the event concerns `user_id`
    pub fn involves_user(&self, user_id: usize) -> bool {
        match self {
            Event::Draw { user_id: id, .. } => *id == user_id,
            Event::RankReassigned { user_id: id, .. } => *id == user_id,
            Event::Collision { user_ids, .. } => user_ids.contains(&user_id),
            Event::WarmupComplete { .. } => false,
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific round
    pub fn events_at_round(&self, round: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.round() == round).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific user
    pub fn events_for_user(&self, user_id: usize) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.involves_user(user_id))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
