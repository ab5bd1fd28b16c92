//! Persistence configuration.

use serde::{Deserialize, Serialize};

/// Which durable backend sits behind the session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceProvider {
    /// Keep everything in process memory.
    #[default]
    Memory,
    /// A single JSON document on the local filesystem.
    JsonFile,
}

impl std::fmt::Display for PersistenceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceProvider::Memory => write!(f, "memory"),
            PersistenceProvider::JsonFile => write!(f, "json_file"),
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend selection.
    #[serde(default)]
    pub provider: PersistenceProvider,
    /// Path of the schedule document for the `json_file` provider.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            provider: PersistenceProvider::default(),
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/schedule.json".to_string()
}
