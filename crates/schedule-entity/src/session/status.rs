//! Session lifecycle status.

use serde::{Deserialize, Serialize};

/// Whether a session still runs.
///
/// Cancelling keeps the session in the grid so that booking and billing
/// collaborators can react; only deletion removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The session takes place as planned.
    #[default]
    Scheduled,
    /// The session was called off by an administrator.
    Cancelled,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Scheduled => write!(f, "scheduled"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
