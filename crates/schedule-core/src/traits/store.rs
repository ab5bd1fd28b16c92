//! Durable backing store trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Durable backing for an in-memory index of entities.
///
/// The engine keeps the authoritative copy in memory and writes through to
/// the store after each committed mutation. A failed write does not roll
/// back the in-memory state; it is surfaced to the caller instead.
#[async_trait]
pub trait EntityStore<Entity, Id>: Send + Sync + 'static
where
    Entity: Send + Sync + 'static,
    Id: Send + Sync + 'static,
{
    /// Short name of the backend, for logs.
    fn backend(&self) -> &str;

    /// Load every stored entity, used to hydrate the in-memory index.
    async fn load_all(&self) -> AppResult<Vec<Entity>>;

    /// Insert or overwrite an entity.
    async fn upsert(&self, entity: &Entity) -> AppResult<()>;

    /// Delete an entity by id. Returns `true` if something was removed.
    async fn remove(&self, id: &Id) -> AppResult<bool>;
}
