//! Fixtures shared by unit tests.

use schedule_core::types::{SessionId, SessionTypeId, Slot, TrainerId};
use schedule_entity::{Session, SessionFlags, SessionStatus};

/// A half-booked session for `trainer` at the given day and time.
pub(crate) fn session_at(trainer: TrainerId, day: &str, time: &str) -> Session {
    Session {
        id: SessionId::new(),
        title: "Functional training".to_string(),
        slot: Slot::parse(day, time).expect("valid slot"),
        duration_minutes: 60,
        room: "Hall 3".to_string(),
        level: "Intermediate".to_string(),
        description: String::new(),
        trainer_id: trainer,
        session_type_id: SessionTypeId::new(),
        max_participants: 12,
        current_participants: 6,
        flags: SessionFlags::default(),
        status: SessionStatus::Scheduled,
    }
}
