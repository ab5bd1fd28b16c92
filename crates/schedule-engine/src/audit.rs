//! Data-integrity checks.
//!
//! Problems found here are reported, never repaired and never fatal:
//! legacy data may legitimately exceed capacity, and forced moves leave
//! trainer double-bookings behind on purpose.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use schedule_core::types::{SessionId, SessionTypeId, Slot, TrainerId};
use schedule_entity::Session;

use crate::directory::Directory;

/// One integrity problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// The session's trainer is not in the directory.
    UnknownTrainer {
        session_id: SessionId,
        trainer_id: TrainerId,
    },
    /// The session's type is not in the directory.
    UnknownSessionType {
        session_id: SessionId,
        session_type_id: SessionTypeId,
    },
    /// A directory lookup failed, so references could not be verified.
    DirectoryUnavailable { message: String },
    /// More participants than places.
    OverCapacity {
        session_id: SessionId,
        current: u32,
        max: u32,
    },
    /// A session with no places at all.
    ZeroCapacity { session_id: SessionId },
    /// The same trainer holds several sessions in one slot.
    TrainerDoubleBooked {
        trainer_id: TrainerId,
        slot: Slot,
        session_ids: Vec<SessionId>,
    },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTrainer {
                session_id,
                trainer_id,
            } => write!(f, "session {session_id} references unknown trainer {trainer_id}"),
            Self::UnknownSessionType {
                session_id,
                session_type_id,
            } => write!(
                f,
                "session {session_id} references unknown session type {session_type_id}"
            ),
            Self::DirectoryUnavailable { message } => write!(f, "directory unavailable: {message}"),
            Self::OverCapacity {
                session_id,
                current,
                max,
            } => write!(f, "session {session_id} is over capacity ({current}/{max})"),
            Self::ZeroCapacity { session_id } => {
                write!(f, "session {session_id} has a capacity of zero")
            }
            Self::TrainerDoubleBooked {
                trainer_id,
                slot,
                session_ids,
            } => write!(
                f,
                "trainer {trainer_id} holds {} sessions at {slot}",
                session_ids.len()
            ),
        }
    }
}

/// Result of one audit run.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub checked_at: DateTime<Utc>,
    pub sessions_checked: usize,
    pub warnings: Vec<IntegrityWarning>,
}

impl IntegrityReport {
    /// Whether nothing was found.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Stateless integrity checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityAuditor;

impl IntegrityAuditor {
    /// Run every check over a snapshot.
    pub async fn run(directory: &dyn Directory, sessions: &[Session]) -> IntegrityReport {
        let mut warnings = Self::check_references(directory, sessions).await;
        warnings.extend(Self::check_sessions(sessions));
        IntegrityReport {
            checked_at: Utc::now(),
            sessions_checked: sessions.len(),
            warnings,
        }
    }

    /// Capacity and double-booking checks. Needs no collaborators.
    pub fn check_sessions(sessions: &[Session]) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();
        let mut by_trainer_slot: BTreeMap<(Slot, TrainerId), Vec<SessionId>> = BTreeMap::new();

        for session in sessions {
            if session.max_participants == 0 {
                warnings.push(IntegrityWarning::ZeroCapacity {
                    session_id: session.id,
                });
            } else if session.is_over_capacity() {
                warnings.push(IntegrityWarning::OverCapacity {
                    session_id: session.id,
                    current: session.current_participants,
                    max: session.max_participants,
                });
            }
            by_trainer_slot
                .entry((session.slot, session.trainer_id))
                .or_default()
                .push(session.id);
        }

        warnings.extend(
            by_trainer_slot
                .into_iter()
                .filter(|(_, ids)| ids.len() > 1)
                .map(|((slot, trainer_id), session_ids)| IntegrityWarning::TrainerDoubleBooked {
                    trainer_id,
                    slot,
                    session_ids,
                }),
        );
        warnings
    }

    /// Verify trainer and session-type references against the directory.
    /// Each distinct id is looked up once.
    pub async fn check_references(
        directory: &dyn Directory,
        sessions: &[Session],
    ) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();
        let mut missing_trainers = HashSet::new();
        let mut known_trainers = HashSet::new();
        let mut missing_types = HashSet::new();
        let mut known_types = HashSet::new();

        for session in sessions {
            let trainer_id = session.trainer_id;
            if !known_trainers.contains(&trainer_id) && !missing_trainers.contains(&trainer_id) {
                match directory.trainer(&trainer_id).await {
                    Ok(Some(_)) => {
                        known_trainers.insert(trainer_id);
                    }
                    Ok(None) => {
                        missing_trainers.insert(trainer_id);
                    }
                    Err(e) => {
                        warnings.push(IntegrityWarning::DirectoryUnavailable { message: e.message });
                        known_trainers.insert(trainer_id);
                    }
                }
            }
            if missing_trainers.contains(&trainer_id) {
                warnings.push(IntegrityWarning::UnknownTrainer {
                    session_id: session.id,
                    trainer_id,
                });
            }

            let type_id = session.session_type_id;
            if !known_types.contains(&type_id) && !missing_types.contains(&type_id) {
                match directory.session_type(&type_id).await {
                    Ok(Some(_)) => {
                        known_types.insert(type_id);
                    }
                    Ok(None) => {
                        missing_types.insert(type_id);
                    }
                    Err(e) => {
                        warnings.push(IntegrityWarning::DirectoryUnavailable { message: e.message });
                        known_types.insert(type_id);
                    }
                }
            }
            if missing_types.contains(&type_id) {
                warnings.push(IntegrityWarning::UnknownSessionType {
                    session_id: session.id,
                    session_type_id: type_id,
                });
            }
        }
        warnings
    }
}
