//! Trainer reference entity.

use serde::{Deserialize, Serialize};

use schedule_core::types::TrainerId;

/// A trainer as published by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    /// Directory id.
    pub id: TrainerId,
    /// Display name.
    pub name: String,
    /// Primary discipline, e.g. "Yoga".
    #[serde(default)]
    pub specialization: Option<String>,
}

impl Trainer {
    /// Creates a trainer record.
    pub fn new(id: TrainerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            specialization: None,
        }
    }
}
