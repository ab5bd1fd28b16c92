//! Read-only access to the external trainer/session-type directory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use schedule_core::error::AppError;
use schedule_core::result::AppResult;
use schedule_core::types::{SessionTypeId, TrainerId};
use schedule_entity::{SessionType, Trainer};

/// Lookup of reference entities the engine consults but does not own.
///
/// A missing entry is `Ok(None)`; the engine treats it as a data-integrity
/// warning. `Err` means the directory itself could not be reached.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// Look up a trainer.
    async fn trainer(&self, id: &TrainerId) -> AppResult<Option<Trainer>>;

    /// Look up a session type.
    async fn session_type(&self, id: &SessionTypeId) -> AppResult<Option<SessionType>>;
}

/// Directory held in process memory.
///
/// It can be taken offline on demand, which lets callers exercise the
/// unreachable-directory path.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    trainers: RwLock<HashMap<TrainerId, Trainer>>,
    session_types: RwLock<HashMap<SessionTypeId, SessionType>>,
    unavailable: AtomicBool,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-populated with the given entries.
    pub fn with_entries(trainers: Vec<Trainer>, session_types: Vec<SessionType>) -> Self {
        Self {
            trainers: RwLock::new(trainers.into_iter().map(|t| (t.id, t)).collect()),
            session_types: RwLock::new(session_types.into_iter().map(|t| (t.id, t)).collect()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make subsequent lookups fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::directory("Directory is unavailable"));
        }
        Ok(())
    }

    /// Add or replace a trainer.
    pub async fn upsert_trainer(&self, trainer: Trainer) {
        self.trainers.write().await.insert(trainer.id, trainer);
    }

    /// Add or replace a session type.
    pub async fn upsert_session_type(&self, session_type: SessionType) {
        self.session_types
            .write()
            .await
            .insert(session_type.id, session_type);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn trainer(&self, id: &TrainerId) -> AppResult<Option<Trainer>> {
        self.check_available()?;
        Ok(self.trainers.read().await.get(id).cloned())
    }

    async fn session_type(&self, id: &SessionTypeId) -> AppResult<Option<SessionType>> {
        self.check_available()?;
        Ok(self.session_types.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedule_core::error::ErrorKind;

    #[tokio::test]
    async fn test_lookup() {
        let trainer = Trainer::new(TrainerId::new(), "Anna Petrova");
        let directory = MemoryDirectory::with_entries(vec![trainer.clone()], vec![]);

        assert_eq!(directory.trainer(&trainer.id).await.unwrap(), Some(trainer));
        assert_eq!(directory.trainer(&TrainerId::new()).await.unwrap(), None);
        assert_eq!(directory.session_type(&SessionTypeId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_session_type() {
        let directory = MemoryDirectory::new();
        let yoga = SessionType::new(SessionTypeId::new(), "Yoga");
        directory.upsert_session_type(yoga.clone()).await;

        assert_eq!(directory.session_type(&yoga.id).await.unwrap(), Some(yoga));
    }

    #[tokio::test]
    async fn test_unavailable_directory_fails_lookups() {
        let trainer = Trainer::new(TrainerId::new(), "Anna Petrova");
        let directory = MemoryDirectory::with_entries(vec![trainer.clone()], vec![]);

        directory.set_unavailable(true);
        let err = directory.trainer(&trainer.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Directory);
        let err = directory.session_type(&SessionTypeId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Directory);

        directory.set_unavailable(false);
        assert_eq!(directory.trainer(&trainer.id).await.unwrap(), Some(trainer));
    }
}
