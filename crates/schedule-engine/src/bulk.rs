//! Batched mutations over a caller-selected set of sessions.
//!
//! A batch is not all-or-nothing. Each id runs in its own critical section
//! so one bad id never blocks the rest and a large batch never starves
//! single-session edits. Overlapping batches may interleave between ids.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use schedule_core::context::CommandContext;
use schedule_core::error::{AppError, ErrorKind};
use schedule_core::events::ScheduleEvent;
use schedule_core::result::AppResult;
use schedule_core::types::{BatchId, SessionId, Slot};
use schedule_entity::{Session, SessionStatus};

use crate::engine::{ScheduleEngine, StoreWrite};
use crate::transaction::{MoveDecision, MoveState, MoveTransaction};

/// Where a bulk move sends each session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Every session goes to the same slot.
    Same(Slot),
    /// Each session goes to its own slot. Ids without an entry fail.
    PerSession(HashMap<SessionId, Slot>),
}

impl MoveTarget {
    fn for_session(&self, id: &SessionId) -> AppResult<Slot> {
        match self {
            Self::Same(slot) => Ok(*slot),
            Self::PerSession(map) => map
                .get(id)
                .copied()
                .ok_or_else(|| AppError::validation(format!("No target slot given for session {id}"))),
        }
    }
}

/// Operation applied to every id of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BulkOperation {
    /// Relocate. Conflicting ids fail unless `force` is set.
    Move {
        /// Destination(s).
        target: MoveTarget,
        /// Apply despite trainer conflicts.
        force: bool,
    },
    /// Copy into the same slot with a fresh id and no bookings.
    Duplicate,
    /// Mark as cancelled, keeping the session in the grid.
    Cancel,
    /// Remove permanently.
    Delete,
}

impl BulkOperation {
    /// The operation without its parameters.
    pub fn kind(&self) -> BulkOperationKind {
        match self {
            Self::Move { .. } => BulkOperationKind::Move,
            Self::Duplicate => BulkOperationKind::Duplicate,
            Self::Cancel => BulkOperationKind::Cancel,
            Self::Delete => BulkOperationKind::Delete,
        }
    }
}

/// Bulk operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperationKind {
    Move,
    Duplicate,
    Cancel,
    Delete,
}

impl fmt::Display for BulkOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Move => "move",
            Self::Duplicate => "duplicate",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

impl FromStr for BulkOperationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "duplicate" | "copy" => Ok(Self::Duplicate),
            "cancel" => Ok(Self::Cancel),
            "delete" => Ok(Self::Delete),
            other => Err(AppError::validation(format!("Unknown bulk operation: '{other}'"))),
        }
    }
}

/// What happened to one successfully processed id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SuccessDetail {
    /// The session was relocated (or already sat in the target).
    Moved {
        from: Slot,
        to: Slot,
        forced: bool,
    },
    /// A copy was created.
    Duplicated {
        /// Id of the copy.
        copy_id: SessionId,
    },
    /// The session is cancelled.
    Cancelled {
        /// It was cancelled before this batch.
        already_cancelled: bool,
    },
    /// The session is gone.
    Deleted,
}

/// Why one id failed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The session does not exist.
    NotFound { message: String },
    /// The move collides with these sessions of the same trainer.
    Conflict { conflicts: Vec<Session> },
    /// The request for this id was malformed.
    Validation { message: String },
    /// Anything else.
    Error { kind: ErrorKind, message: String },
}

impl FailureReason {
    /// The error kind this failure corresponds to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Error { kind, .. } => *kind,
        }
    }
}

impl From<AppError> for FailureReason {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::NotFound => Self::NotFound {
                message: err.message,
            },
            ErrorKind::Validation => Self::Validation {
                message: err.message,
            },
            kind => Self::Error {
                kind,
                message: err.message,
            },
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { message } | Self::Validation { message } => f.write_str(message),
            Self::Conflict { conflicts } => {
                write!(f, "trainer already booked by {} session(s)", conflicts.len())
            }
            Self::Error { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

/// A processed id.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSuccess {
    pub session_id: SessionId,
    pub detail: SuccessDetail,
    /// Set when the change is committed in memory but the durable write
    /// failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

/// A rejected id.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub session_id: SessionId,
    pub reason: FailureReason,
}

/// Per-id report of one batch.
///
/// Every distinct submitted id appears exactly once, either in `successes`
/// or in `failures`, each list in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: BatchId,
    pub operation: BulkOperationKind,
    pub successes: Vec<BatchSuccess>,
    pub failures: Vec<BatchFailure>,
}

impl BatchResult {
    fn new(operation: BulkOperationKind) -> Self {
        Self {
            batch_id: BatchId::new(),
            operation,
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of ids processed.
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether no id failed.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The success entry for an id.
    pub fn success_for(&self, id: &SessionId) -> Option<&BatchSuccess> {
        self.successes.iter().find(|s| s.session_id == *id)
    }

    /// The failure entry for an id.
    pub fn failure_for(&self, id: &SessionId) -> Option<&BatchFailure> {
        self.failures.iter().find(|f| f.session_id == *id)
    }

    fn record(&mut self, session_id: SessionId, outcome: Result<Committed, FailureReason>) {
        match outcome {
            Ok(Committed {
                detail,
                persistence_error,
            }) => self.successes.push(BatchSuccess {
                session_id,
                detail,
                persistence_error,
            }),
            Err(reason) => self.failures.push(BatchFailure { session_id, reason }),
        }
    }
}

/// A per-id change that is committed in memory.
struct Committed {
    detail: SuccessDetail,
    persistence_error: Option<String>,
}

impl Committed {
    fn new(detail: SuccessDetail, written: AppResult<()>) -> Self {
        Self {
            detail,
            persistence_error: written.err().map(|e| e.message),
        }
    }

    fn unchanged(detail: SuccessDetail) -> Self {
        Self {
            detail,
            persistence_error: None,
        }
    }
}

/// Runs a [`BulkOperation`] against an engine.
#[derive(Debug)]
pub struct BulkOperationProcessor<'e> {
    engine: &'e ScheduleEngine,
}

impl<'e> BulkOperationProcessor<'e> {
    pub fn new(engine: &'e ScheduleEngine) -> Self {
        Self { engine }
    }

    /// Process each distinct id once, in submission order.
    pub async fn apply(
        &self,
        ctx: &CommandContext,
        operation: BulkOperation,
        session_ids: &[SessionId],
    ) -> BatchResult {
        let mut result = BatchResult::new(operation.kind());
        let mut seen = HashSet::with_capacity(session_ids.len());

        for id in session_ids.iter().filter(|id| seen.insert(**id)) {
            let outcome = match &operation {
                BulkOperation::Move { target, force } => match target.for_session(id) {
                    Ok(slot) => self.move_one(ctx, id, slot, *force).await,
                    Err(e) => Err(e.into()),
                },
                BulkOperation::Duplicate => self.duplicate_one(ctx, id).await,
                BulkOperation::Cancel => self.cancel_one(ctx, id).await,
                BulkOperation::Delete => self.delete_one(ctx, id).await,
            };
            result.record(*id, outcome);
        }

        if result.is_complete_success() {
            info!(
                batch_id = %result.batch_id,
                operation = %result.operation,
                successes = result.successes.len(),
                "Batch applied"
            );
        } else {
            warn!(
                batch_id = %result.batch_id,
                operation = %result.operation,
                successes = result.successes.len(),
                failures = result.failures.len(),
                "Batch applied with failures"
            );
        }
        result
    }

    async fn move_one(
        &self,
        ctx: &CommandContext,
        id: &SessionId,
        target: Slot,
        force: bool,
    ) -> Result<Committed, FailureReason> {
        self.engine.grid_config().check_target(&target)?;

        let (session, from, forced, turn) = {
            let mut state = self.engine.state.write().await;
            state.discard_pending(id);
            let mut tx = MoveTransaction::propose(&mut state.registry, id, target)?;
            if tx.state() == MoveState::Conflicting {
                if !force {
                    return Err(FailureReason::Conflict {
                        conflicts: tx.conflicts().to_vec(),
                    });
                }
                tx.resolve(MoveDecision::Force, &mut state.registry)?;
            }
            let session = state.registry.get(id)?.clone();
            let turn = if tx.from == session.slot {
                None
            } else {
                Some(self.engine.reserve_write().await)
            };
            (session, tx.from, tx.forced(), turn)
        };

        let detail = SuccessDetail::Moved {
            from,
            to: session.slot,
            forced,
        };
        let Some(turn) = turn else {
            return Ok(Committed::unchanged(detail));
        };

        let written = self
            .engine
            .settle(
                turn,
                ctx,
                StoreWrite::Upsert(&session),
                ScheduleEvent::SessionMoved {
                    session_id: session.id,
                    trainer_id: session.trainer_id,
                    from,
                    to: session.slot,
                    forced,
                },
            )
            .await;
        Ok(Committed::new(detail, written))
    }

    async fn duplicate_one(
        &self,
        ctx: &CommandContext,
        id: &SessionId,
    ) -> Result<Committed, FailureReason> {
        let (copy, turn) = {
            let mut state = self.engine.state.write().await;
            let copy = state.registry.get(id)?.duplicate_as(SessionId::new());
            state.registry.insert(copy.clone())?;
            (copy, self.engine.reserve_write().await)
        };

        let written = self
            .engine
            .settle(
                turn,
                ctx,
                StoreWrite::Upsert(&copy),
                ScheduleEvent::SessionDuplicated {
                    source_id: *id,
                    copy_id: copy.id,
                    slot: copy.slot,
                },
            )
            .await;
        Ok(Committed::new(
            SuccessDetail::Duplicated { copy_id: copy.id },
            written,
        ))
    }

    async fn cancel_one(
        &self,
        ctx: &CommandContext,
        id: &SessionId,
    ) -> Result<Committed, FailureReason> {
        let (session, turn) = {
            let mut state = self.engine.state.write().await;
            let changed = state.registry.set_status(id, SessionStatus::Cancelled)?;
            let session = state.registry.get(id)?.clone();
            let turn = if changed {
                Some(self.engine.reserve_write().await)
            } else {
                None
            };
            (session, turn)
        };

        let Some(turn) = turn else {
            return Ok(Committed::unchanged(SuccessDetail::Cancelled {
                already_cancelled: true,
            }));
        };

        let written = self
            .engine
            .settle(
                turn,
                ctx,
                StoreWrite::Upsert(&session),
                ScheduleEvent::SessionCancelled {
                    session_id: session.id,
                    trainer_id: session.trainer_id,
                    slot: session.slot,
                },
            )
            .await;
        Ok(Committed::new(
            SuccessDetail::Cancelled {
                already_cancelled: false,
            },
            written,
        ))
    }

    async fn delete_one(
        &self,
        ctx: &CommandContext,
        id: &SessionId,
    ) -> Result<Committed, FailureReason> {
        let (removed, turn) = {
            let mut state = self.engine.state.write().await;
            let removed = state.registry.remove(id)?;
            let dropped = state.discard_pending(id);
            if dropped > 0 {
                debug!(session_id = %id, dropped, "Pending moves of deleted session dropped");
            }
            (removed, self.engine.reserve_write().await)
        };

        let written = self
            .engine
            .settle(
                turn,
                ctx,
                StoreWrite::Remove(id),
                ScheduleEvent::SessionDeleted {
                    session_id: removed.id,
                    trainer_id: removed.trainer_id,
                    slot: removed.slot,
                },
            )
            .await;
        Ok(Committed::new(SuccessDetail::Deleted, written))
    }
}
