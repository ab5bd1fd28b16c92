//! In-memory session store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use schedule_core::error::AppError;
use schedule_core::result::AppResult;
use schedule_core::traits::EntityStore;
use schedule_core::types::SessionId;
use schedule_entity::Session;

use super::ScheduleDocument;

/// Session store kept in process memory.
///
/// Writes can be made to fail on demand, which lets callers exercise the
/// committed-but-not-durable path.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    document: RwLock<ScheduleDocument>,
    fail_writes: AtomicBool,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `sessions`.
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            document: RwLock::new(ScheduleDocument {
                sessions,
                ..ScheduleDocument::default()
            }),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored sessions.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.document.read().await.sessions.clone()
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::persistence("Memory store is refusing writes"));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore<Session, SessionId> for MemorySessionStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn load_all(&self) -> AppResult<Vec<Session>> {
        Ok(self.snapshot().await)
    }

    async fn upsert(&self, session: &Session) -> AppResult<()> {
        self.check_writable()?;
        self.document.write().await.upsert(session);
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> AppResult<bool> {
        self.check_writable()?;
        Ok(self.document.write().await.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_at;
    use schedule_core::error::ErrorKind;
    use schedule_core::types::TrainerId;

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let store = MemorySessionStore::new();
        let mut session = session_at(TrainerId::new(), "monday", "08:00");

        store.upsert(&session).await.unwrap();
        session.title = "Evening pilates".to_string();
        store.upsert(&session).await.unwrap();

        let stored = store.load_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Evening pilates");

        assert!(store.remove(&session.id).await.unwrap());
        assert!(!store.remove(&session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_refused_writes() {
        let store = MemorySessionStore::new();
        store.set_fail_writes(true);
        let session = session_at(TrainerId::new(), "monday", "08:00");

        let err = store.upsert(&session).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Persistence);
        assert!(store.snapshot().await.is_empty());
    }
}
