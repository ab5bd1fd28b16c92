//! Move transaction configuration.

use serde::{Deserialize, Serialize};

/// Settings for conflicting moves awaiting a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovesConfig {
    /// Seconds a conflicting move may wait for a force/abort decision
    /// before it is discarded.
    #[serde(default = "default_pending_ttl_seconds")]
    pub pending_ttl_seconds: u64,
}

impl Default for MovesConfig {
    fn default() -> Self {
        Self {
            pending_ttl_seconds: default_pending_ttl_seconds(),
        }
    }
}

fn default_pending_ttl_seconds() -> u64 {
    900
}
