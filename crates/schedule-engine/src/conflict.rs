//! Trainer double-booking detection.
//!
//! Only trainer identity is checked. Two sessions sharing a room in the
//! same slot are allowed, as are sessions of the same type.

use schedule_core::types::{SessionId, Slot, TrainerId};
use schedule_entity::Session;

use crate::registry::SessionRegistry;

/// Finds sessions that would collide with a proposed placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    /// Sessions already in `target` that belong to `trainer_id`, other than
    /// `exclude` (the session being placed). An empty list means no
    /// conflict.
    pub fn detect(
        registry: &SessionRegistry,
        trainer_id: &TrainerId,
        target: &Slot,
        exclude: Option<&SessionId>,
    ) -> Vec<Session> {
        registry
            .sessions_at(target)
            .into_iter()
            .filter(|s| s.trainer_id == *trainer_id)
            .filter(|s| Some(&s.id) != exclude)
            .cloned()
            .collect()
    }
}
