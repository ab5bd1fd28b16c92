//! Durable stores behind the session registry.

pub mod json_file;
pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use schedule_core::traits::EntityStore;
use schedule_core::types::SessionId;
use schedule_entity::{Session, SessionType, Trainer};

pub use json_file::JsonFileSessionStore;
pub use memory::MemorySessionStore;

/// Shared handle to whichever store backs the engine.
pub type SharedSessionStore = Arc<dyn EntityStore<Session, SessionId>>;

/// On-disk shape of a schedule: the sessions plus a snapshot of the
/// directory entries they reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleDocument {
    /// Trainers known when the document was written.
    #[serde(default)]
    pub trainers: Vec<Trainer>,
    /// Session types known when the document was written.
    #[serde(default)]
    pub session_types: Vec<SessionType>,
    /// Every session in the grid.
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl ScheduleDocument {
    /// Insert or overwrite a session, keeping document order stable.
    pub fn upsert(&mut self, session: &Session) {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => self.sessions.push(session.clone()),
        }
    }

    /// Remove a session. Returns `true` if it was present.
    pub fn remove(&mut self, id: &SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != *id);
        self.sessions.len() != before
    }
}
