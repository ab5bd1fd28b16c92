//! Session type (category) reference entity.

use serde::{Deserialize, Serialize};

use schedule_core::types::SessionTypeId;

/// A category of training activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    /// Directory id.
    pub id: SessionTypeId,
    /// Display name, e.g. "Pilates".
    pub name: String,
    /// Usual length of a session of this type.
    #[serde(default)]
    pub default_duration_minutes: Option<u32>,
    /// Usual capacity of a session of this type.
    #[serde(default)]
    pub default_max_participants: Option<u32>,
}

impl SessionType {
    /// Creates a session type record.
    pub fn new(id: SessionTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            default_duration_minutes: None,
            default_max_participants: None,
        }
    }
}
