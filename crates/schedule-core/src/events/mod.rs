//! Domain events emitted by schedule mutations.
//!
//! Events are published after the in-memory mutation commits and are
//! consumed by out-of-scope collaborators (notification, billing, audit).
//! The engine never waits for their acknowledgment.

pub mod schedule;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AdminId;

pub use schedule::ScheduleEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The administrator who caused the event (if known).
    pub actor_id: Option<AdminId>,
    /// The event payload.
    pub payload: ScheduleEvent,
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<AdminId>, payload: ScheduleEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
