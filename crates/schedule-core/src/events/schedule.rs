//! Schedule-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{SessionId, Slot, TrainerId};

/// Events describing committed changes to the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScheduleEvent {
    /// A session was handed to the engine.
    SessionAdded {
        /// The new session.
        session_id: SessionId,
        /// Where it was placed.
        slot: Slot,
    },
    /// A session was relocated to another slot.
    SessionMoved {
        /// The moved session.
        session_id: SessionId,
        /// Its owning trainer.
        trainer_id: TrainerId,
        /// The slot it left.
        from: Slot,
        /// The slot it now occupies.
        to: Slot,
        /// Whether a detected trainer conflict was overridden.
        forced: bool,
    },
    /// A session was copied into a new session.
    SessionDuplicated {
        /// The session that was copied.
        source_id: SessionId,
        /// The freshly created copy.
        copy_id: SessionId,
        /// The slot both occupy.
        slot: Slot,
    },
    /// A session was marked cancelled. Booking refunds and client
    /// notifications react to this.
    SessionCancelled {
        /// The cancelled session.
        session_id: SessionId,
        /// Its owning trainer.
        trainer_id: TrainerId,
        /// The slot it occupies.
        slot: Slot,
    },
    /// A session was permanently removed.
    SessionDeleted {
        /// The removed session.
        session_id: SessionId,
        /// Its owning trainer.
        trainer_id: TrainerId,
        /// The slot it occupied.
        slot: Slot,
    },
}

impl ScheduleEvent {
    /// The session the event is about.
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::SessionAdded { session_id, .. }
            | Self::SessionMoved { session_id, .. }
            | Self::SessionCancelled { session_id, .. }
            | Self::SessionDeleted { session_id, .. } => *session_id,
            Self::SessionDuplicated { copy_id, .. } => *copy_id,
        }
    }
}
