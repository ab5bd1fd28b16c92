//! Move transactions.
//!
//! A relocation runs through an explicit state machine:
//!
//! ```text
//! Proposed ──► Accepted ──────────────► Applied
//!     │                                   ▲
//!     └──────► Conflicting ──(force)──────┘
//!                   └───────(abort)─────► Aborted
//! ```
//!
//! A conflicting transaction never touches the registry. The caller sees
//! the full conflict set and either forces the move or aborts it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use schedule_core::error::AppError;
use schedule_core::result::AppResult;
use schedule_core::types::{SessionId, Slot, TrainerId, TransactionId};
use schedule_entity::Session;

use crate::conflict::ConflictDetector;
use crate::registry::SessionRegistry;

/// Lifecycle state of a [`MoveTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    /// Created, conflicts not yet checked.
    Proposed,
    /// The target holds another session of the same trainer.
    Conflicting,
    /// No conflict; about to be applied.
    Accepted,
    /// The session now occupies the target slot.
    Applied,
    /// Abandoned without touching the registry.
    Aborted,
}

impl MoveState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Aborted)
    }

    fn can_become(self, next: MoveState) -> bool {
        use MoveState::*;
        matches!(
            (self, next),
            (Proposed, Conflicting)
                | (Proposed, Accepted)
                | (Accepted, Applied)
                | (Conflicting, Applied)
                | (Conflicting, Aborted)
        )
    }
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Proposed => "proposed",
            Self::Conflicting => "conflicting",
            Self::Accepted => "accepted",
            Self::Applied => "applied",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// How the caller settles a conflicting move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDecision {
    /// Apply the move despite the conflict.
    Force,
    /// Leave the grid as it is.
    Abort,
}

impl FromStr for MoveDecision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "force" => Ok(Self::Force),
            "abort" => Ok(Self::Abort),
            other => Err(AppError::validation(format!(
                "Unknown decision '{other}', expected 'force' or 'abort'"
            ))),
        }
    }
}

/// One attempt to relocate a session.
#[derive(Debug, Clone, Serialize)]
pub struct MoveTransaction {
    /// Transaction id, used to resolve a conflict later.
    pub id: TransactionId,
    /// The session being moved.
    pub session_id: SessionId,
    /// Its trainer, the key of conflict detection.
    pub trainer_id: TrainerId,
    /// The slot the session occupied when last observed.
    pub from: Slot,
    /// Where the session should go.
    pub target: Slot,
    /// When the move was proposed.
    pub created_at: DateTime<Utc>,
    state: MoveState,
    conflicts: Vec<Session>,
    forced: bool,
}

impl MoveTransaction {
    /// Start a transaction for `session` in the `Proposed` state.
    pub fn begin(session: &Session, target: Slot) -> Self {
        Self {
            id: TransactionId::new(),
            session_id: session.id,
            trainer_id: session.trainer_id,
            from: session.slot,
            target,
            created_at: Utc::now(),
            state: MoveState::Proposed,
            conflicts: Vec::new(),
            forced: false,
        }
    }

    /// Load the session, check for conflicts and, if there are none, apply
    /// the move. The returned transaction is either `Applied` or
    /// `Conflicting`; in the latter case the registry is untouched.
    pub fn propose(
        registry: &mut SessionRegistry,
        session_id: &SessionId,
        target: Slot,
    ) -> AppResult<Self> {
        let session = registry.get(session_id)?;
        let mut tx = Self::begin(session, target);
        if tx.check(registry)? == MoveState::Accepted {
            tx.apply(registry)?;
        }
        Ok(tx)
    }

    /// Current state.
    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Sessions that collided with the target when the move was checked.
    pub fn conflicts(&self) -> &[Session] {
        &self.conflicts
    }

    /// Whether a conflict was overridden to apply this move.
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// Run conflict detection. `Proposed` becomes `Conflicting` or
    /// `Accepted`.
    pub fn check(&mut self, registry: &SessionRegistry) -> AppResult<MoveState> {
        let conflicts = ConflictDetector::detect(
            registry,
            &self.trainer_id,
            &self.target,
            Some(&self.session_id),
        );

        if conflicts.is_empty() {
            self.advance(MoveState::Accepted)?;
        } else {
            debug!(
                transaction_id = %self.id,
                session_id = %self.session_id,
                target = %self.target,
                conflicts = conflicts.len(),
                "Move conflicts with existing sessions"
            );
            self.conflicts = conflicts;
            self.advance(MoveState::Conflicting)?;
        }
        Ok(self.state)
    }

    /// Relocate an `Accepted` session. Returns the slot it left.
    pub fn apply(&mut self, registry: &mut SessionRegistry) -> AppResult<Slot> {
        if self.state != MoveState::Accepted {
            return Err(AppError::invalid_state(format!(
                "Transaction {} is {}, only accepted moves can be applied",
                self.id, self.state
            )));
        }
        self.relocate(registry)
    }

    /// Settle a `Conflicting` transaction.
    ///
    /// `Force` relocates unconditionally; `Abort` leaves the registry alone.
    /// If the session vanished since the proposal, a forced move aborts and
    /// reports `NotFound`.
    pub fn resolve(
        &mut self,
        decision: MoveDecision,
        registry: &mut SessionRegistry,
    ) -> AppResult<MoveState> {
        if self.state != MoveState::Conflicting {
            return Err(AppError::invalid_state(format!(
                "Transaction {} is {}, only conflicting moves can be resolved",
                self.id, self.state
            )));
        }

        match decision {
            MoveDecision::Abort => {
                self.advance(MoveState::Aborted)?;
                info!(transaction_id = %self.id, session_id = %self.session_id, "Move aborted");
            }
            MoveDecision::Force => {
                if !registry.contains(&self.session_id) {
                    self.advance(MoveState::Aborted)?;
                    return Err(AppError::not_found(format!(
                        "Session {} no longer exists",
                        self.session_id
                    )));
                }
                self.forced = true;
                self.relocate(registry)?;
            }
        }
        Ok(self.state)
    }

    fn relocate(&mut self, registry: &mut SessionRegistry) -> AppResult<Slot> {
        let from = registry.relocate(&self.session_id, self.target)?;
        self.from = from;
        self.advance(MoveState::Applied)?;
        Ok(from)
    }

    fn advance(&mut self, next: MoveState) -> AppResult<()> {
        if !self.state.can_become(next) {
            return Err(AppError::invalid_state(format!(
                "Transaction {} cannot go from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

/// Result of proposing or resolving a move, as seen by the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The session was relocated.
    Applied {
        /// The transaction that applied the move.
        transaction_id: TransactionId,
        /// The session as it now stands.
        session: Session,
        /// The slot it left.
        from: Slot,
        /// Whether a conflict was overridden.
        forced: bool,
    },
    /// The move collides with the listed sessions and awaits a decision.
    Conflicting {
        /// Transaction to pass to `resolve_move`.
        transaction_id: TransactionId,
        /// The session that was to be moved.
        session_id: SessionId,
        /// The requested slot.
        target: Slot,
        /// Every session of the same trainer already in the target.
        conflicts: Vec<Session>,
    },
    /// The conflicting move was abandoned.
    Aborted {
        /// The abandoned transaction.
        transaction_id: TransactionId,
        /// The session that stayed in place.
        session_id: SessionId,
    },
}

impl MoveOutcome {
    /// Whether the move took effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The conflict set, if the move is awaiting a decision.
    pub fn conflicts(&self) -> Option<&[Session]> {
        match self {
            Self::Conflicting { conflicts, .. } => Some(conflicts),
            _ => None,
        }
    }

    /// The transaction this outcome belongs to.
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Applied { transaction_id, .. }
            | Self::Conflicting { transaction_id, .. }
            | Self::Aborted { transaction_id, .. } => *transaction_id,
        }
    }
}
