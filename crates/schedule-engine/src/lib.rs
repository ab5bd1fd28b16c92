//! # schedule-engine
//!
//! The weekly schedule engine. Holds the authoritative session set in
//! memory behind one reader/writer lock, detects trainer conflicts, runs
//! moves through an explicit transaction state machine and applies bulk
//! operations id by id.
//!
//! Collaborators are injected at construction time via `Arc` references:
//! a session store for write-through, a directory of trainers and session
//! types, and an event sink.

pub mod audit;
pub mod bulk;
pub mod capacity;
pub mod conflict;
pub mod directory;
pub mod engine;
pub mod events;
pub mod grid;
pub mod query;
pub mod registry;
pub mod store;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use audit::{IntegrityAuditor, IntegrityReport, IntegrityWarning};
pub use bulk::{
    BatchFailure, BatchResult, BatchSuccess, BulkOperation, BulkOperationKind,
    BulkOperationProcessor, FailureReason, MoveTarget, SuccessDetail,
};
pub use capacity::CapacityClassifier;
pub use conflict::ConflictDetector;
pub use directory::{Directory, MemoryDirectory};
pub use engine::ScheduleEngine;
pub use events::BroadcastEventBus;
pub use grid::{GridCell, WeekGrid};
pub use query::{NameIndex, QueryResult, ScheduleQuery, ScheduleQueryService, StatusFilter};
pub use registry::SessionRegistry;
pub use store::{JsonFileSessionStore, MemorySessionStore, ScheduleDocument, SharedSessionStore};
pub use transaction::{MoveDecision, MoveOutcome, MoveState, MoveTransaction};
