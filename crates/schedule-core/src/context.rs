//! Command context carrying the administrator behind a mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AdminId;

/// Context for one inbound command.
///
/// The engine performs no authentication; the actor id only flows into
/// emitted events and log lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    /// The administrator issuing the command, if known.
    pub actor_id: Option<AdminId>,
    /// When the command was received.
    pub request_time: DateTime<Utc>,
}

impl CommandContext {
    /// Creates a context for the given administrator.
    pub fn new(actor_id: AdminId) -> Self {
        Self {
            actor_id: Some(actor_id),
            request_time: Utc::now(),
        }
    }

    /// Creates a context for engine-internal or scripted commands.
    pub fn system() -> Self {
        Self {
            actor_id: None,
            request_time: Utc::now(),
        }
    }
}
