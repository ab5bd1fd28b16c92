//! JSON document store on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use schedule_core::error::{AppError, ErrorKind};
use schedule_core::result::AppResult;
use schedule_core::traits::EntityStore;
use schedule_core::types::SessionId;
use schedule_entity::Session;

use super::ScheduleDocument;
use crate::directory::MemoryDirectory;

/// Keeps the whole schedule as one pretty-printed JSON document.
///
/// Every write rewrites the document through a temporary sibling file
/// followed by a rename, so readers never observe a half-written file.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    document: Mutex<ScheduleDocument>,
}

impl JsonFileSessionStore {
    /// Open the document at `path`. A missing file is an empty schedule.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = read_document(&path).await?;
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a directory from the trainers and session types stored
    /// alongside the sessions.
    pub async fn directory(&self) -> MemoryDirectory {
        let document = self.document.lock().await;
        MemoryDirectory::with_entries(document.trainers.clone(), document.session_types.clone())
    }

    async fn persist(&self, document: &ScheduleDocument) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Persistence,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let json = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to write schedule: {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to replace schedule: {}", self.path.display()),
                e,
            )
        })?;

        debug!(path = %self.path.display(), sessions = document.sessions.len(), "Schedule written");
        Ok(())
    }
}

async fn read_document(path: &Path) -> AppResult<ScheduleDocument> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Malformed schedule document: {}", path.display()),
                e,
            )
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ScheduleDocument::default()),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Persistence,
            format!("Failed to read schedule: {}", path.display()),
            e,
        )),
    }
}

#[async_trait]
impl EntityStore<Session, SessionId> for JsonFileSessionStore {
    fn backend(&self) -> &str {
        "json_file"
    }

    async fn load_all(&self) -> AppResult<Vec<Session>> {
        Ok(self.document.lock().await.sessions.clone())
    }

    async fn upsert(&self, session: &Session) -> AppResult<()> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        next.upsert(session);
        self.persist(&next).await?;
        *document = next;
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> AppResult<bool> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        if !next.remove(id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *document = next;
        Ok(true)
    }
}
