//! Session entity model.

use serde::{Deserialize, Serialize};

use schedule_core::types::{SessionId, SessionTypeId, Slot, TrainerId};

use super::status::SessionStatus;

/// Informational flags maintained by external collaborators (billing,
/// membership limits). The engine reads them but never changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFlags {
    /// Repeats every week.
    pub is_recurring: bool,
    /// Clients are queued for a free place.
    pub has_waiting_list: bool,
    /// At least one participant has an outstanding payment.
    pub has_payment_issues: bool,
    /// Membership restrictions apply to this session.
    pub has_restrictions: bool,
    /// The session's booking period has lapsed.
    pub is_expired: bool,
}

/// A scheduled training activity occupying one grid slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier. Never changes once created.
    pub id: SessionId,
    /// Card title shown on the grid.
    pub title: String,
    /// The grid cell the session occupies.
    pub slot: Slot,
    /// Length of the session.
    pub duration_minutes: u32,
    /// Room the session is held in.
    pub room: String,
    /// Difficulty level, free text.
    #[serde(default)]
    pub level: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Owning trainer (directory reference).
    pub trainer_id: TrainerId,
    /// Category (directory reference).
    pub session_type_id: SessionTypeId,
    /// Capacity. Zero is legacy data and is reported by audits.
    pub max_participants: u32,
    /// Booked participants, maintained by the booking service. May exceed
    /// `max_participants` in legacy data; that is reported, never clamped.
    pub current_participants: u32,
    /// Collaborator-maintained flags.
    #[serde(default)]
    pub flags: SessionFlags,
    /// Lifecycle status.
    #[serde(default)]
    pub status: SessionStatus,
}

impl Session {
    /// Whether the session has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == SessionStatus::Cancelled
    }

    /// Whether more participants are booked than the session holds.
    pub fn is_over_capacity(&self) -> bool {
        self.current_participants > self.max_participants
    }

    /// Build a copy under a new id with no bookings. The copy stays in the
    /// same slot; every other field is taken over unchanged.
    pub fn duplicate_as(&self, id: SessionId) -> Session {
        Session {
            id,
            current_participants: 0,
            ..self.clone()
        }
    }
}
