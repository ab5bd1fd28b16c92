//! Authoritative in-memory set of sessions.
//!
//! The registry is a plain data structure; callers serialize access to it
//! through the engine's lock. It keeps two indexes that must always agree:
//! sessions by id, and session ids by slot in insertion order.

use std::collections::HashMap;

use schedule_core::error::AppError;
use schedule_core::result::AppResult;
use schedule_core::types::{SessionId, Slot};
use schedule_entity::{Session, SessionStatus};

/// Dual-indexed session store.
#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    /// Session id → session.
    by_id: HashMap<SessionId, Session>,
    /// Slot → ids occupying it, in insertion order.
    by_slot: HashMap<Slot, Vec<SessionId>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Whether a session with this id exists.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Look up a session by id.
    pub fn get(&self, id: &SessionId) -> AppResult<&Session> {
        self.by_id
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))
    }

    /// Sessions occupying a slot, in the order they arrived there.
    pub fn sessions_at(&self, slot: &Slot) -> Vec<&Session> {
        self.by_slot
            .get(slot)
            .map(|ids| ids.iter().map(|id| self.resolve(id)).collect())
            .unwrap_or_default()
    }

    /// Add a new session. Fails with `DuplicateId` if the id is taken.
    pub fn insert(&mut self, session: Session) -> AppResult<()> {
        if self.by_id.contains_key(&session.id) {
            return Err(AppError::duplicate_id(format!(
                "Session {} already exists",
                session.id
            )));
        }
        self.by_slot.entry(session.slot).or_default().push(session.id);
        self.by_id.insert(session.id, session);
        Ok(())
    }

    /// Move a session to another slot and return the slot it left.
    ///
    /// Both indexes are updated together. Relocating to the current slot is
    /// a no-op that keeps the session's position within the slot.
    pub fn relocate(&mut self, id: &SessionId, new_slot: Slot) -> AppResult<Slot> {
        let old_slot = self.get(id)?.slot;
        if old_slot == new_slot {
            return Ok(old_slot);
        }

        self.unlink(id, &old_slot);
        self.by_slot.entry(new_slot).or_default().push(*id);
        if let Some(session) = self.by_id.get_mut(id) {
            session.slot = new_slot;
        }
        Ok(old_slot)
    }

    /// Permanently remove a session and return it.
    pub fn remove(&mut self, id: &SessionId) -> AppResult<Session> {
        let session = self
            .by_id
            .remove(id)
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        self.unlink(id, &session.slot);
        Ok(session)
    }

    /// Set a session's status. Returns `true` if the status changed.
    pub fn set_status(&mut self, id: &SessionId, status: SessionStatus) -> AppResult<bool> {
        let session = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        let changed = session.status != status;
        session.status = status;
        Ok(changed)
    }

    /// Occupied slots, earliest first.
    pub fn occupied_slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self.by_slot.keys().copied().collect();
        slots.sort();
        slots
    }

    /// Every session, ordered by slot and then by arrival within the slot.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Session> + '_ {
        self.occupied_slots()
            .into_iter()
            .flat_map(move |slot| self.sessions_at(&slot))
    }

    fn resolve(&self, id: &SessionId) -> &Session {
        match self.by_id.get(id) {
            Some(session) => session,
            None => panic!("session registry corrupted: slot index references unknown session {id}"),
        }
    }

    fn unlink(&mut self, id: &SessionId, slot: &Slot) {
        let Some(ids) = self.by_slot.get_mut(slot) else {
            panic!("session registry corrupted: session {id} missing from slot index {slot}");
        };
        let Some(pos) = ids.iter().position(|s| s == id) else {
            panic!("session registry corrupted: session {id} missing from slot index {slot}");
        };
        ids.remove(pos);
        if ids.is_empty() {
            self.by_slot.remove(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_at;
    use schedule_core::error::ErrorKind;
    use schedule_core::types::TrainerId;

    #[test]
    fn test_insert_and_get() {
        let mut registry = SessionRegistry::new();
        let session = session_at(TrainerId::new(), "monday", "08:00");
        let id = session.id;
        registry.insert(session.clone()).unwrap();

        assert_eq!(registry.get(&id).unwrap(), &session);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut registry = SessionRegistry::new();
        let session = session_at(TrainerId::new(), "monday", "08:00");
        registry.insert(session.clone()).unwrap();

        let err = registry.insert(session).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateId);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sessions_at_keeps_insertion_order() {
        let mut registry = SessionRegistry::new();
        let a = session_at(TrainerId::new(), "monday", "08:00");
        let b = session_at(TrainerId::new(), "monday", "08:00");
        let c = session_at(TrainerId::new(), "monday", "08:00");
        for s in [&a, &b, &c] {
            registry.insert(s.clone()).unwrap();
        }

        let slot = a.slot;
        let ids: Vec<_> = registry.sessions_at(&slot).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);

        registry.remove(&b.id).unwrap();
        let ids: Vec<_> = registry.sessions_at(&slot).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn test_relocate_updates_both_indexes() {
        let mut registry = SessionRegistry::new();
        let session = session_at(TrainerId::new(), "monday", "08:00");
        let id = session.id;
        let from = session.slot;
        registry.insert(session).unwrap();

        let to = Slot::parse("wednesday", "18:00").unwrap();
        let old = registry.relocate(&id, to).unwrap();

        assert_eq!(old, from);
        assert!(registry.sessions_at(&from).is_empty());
        assert_eq!(registry.sessions_at(&to)[0].id, id);
        assert_eq!(registry.get(&id).unwrap().slot, to);
        assert_eq!(registry.occupied_slots(), vec![to]);
    }

    #[test]
    fn test_relocate_to_same_slot_keeps_position() {
        let mut registry = SessionRegistry::new();
        let a = session_at(TrainerId::new(), "monday", "08:00");
        let b = session_at(TrainerId::new(), "monday", "08:00");
        registry.insert(a.clone()).unwrap();
        registry.insert(b.clone()).unwrap();

        registry.relocate(&a.id, a.slot).unwrap();
        let ids: Vec<_> = registry.sessions_at(&a.slot).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_relocate_and_remove_unknown() {
        let mut registry = SessionRegistry::new();
        let ghost = SessionId::new();
        let slot = Slot::parse("monday", "08:00").unwrap();

        assert_eq!(registry.relocate(&ghost, slot).unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(registry.remove(&ghost).unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(registry.get(&ghost).unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_iter_ordered_by_slot() {
        let mut registry = SessionRegistry::new();
        let late = session_at(TrainerId::new(), "friday", "07:00");
        let early = session_at(TrainerId::new(), "monday", "18:00");
        let mid = session_at(TrainerId::new(), "tuesday", "19:00");
        for s in [&late, &early, &mid] {
            registry.insert(s.clone()).unwrap();
        }

        let ids: Vec<_> = registry.iter_ordered().map(|s| s.id).collect();
        assert_eq!(ids, vec![early.id, mid.id, late.id]);
    }

    #[test]
    fn test_set_status_reports_change() {
        let mut registry = SessionRegistry::new();
        let session = session_at(TrainerId::new(), "monday", "08:00");
        let id = session.id;
        registry.insert(session).unwrap();

        assert!(registry.set_status(&id, SessionStatus::Cancelled).unwrap());
        assert!(!registry.set_status(&id, SessionStatus::Cancelled).unwrap());
        assert!(registry.get(&id).unwrap().is_cancelled());
    }
}
