//! Capacity tiers derived from participant-to-capacity ratios.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use schedule_core::error::AppError;

/// Load tier of a session, from emptiest to fullest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTier {
    /// Below 40% booked.
    Low,
    /// 40% up to 70%.
    Medium,
    /// 70% up to 90%.
    High,
    /// 90% or more.
    Full,
}

impl CapacityTier {
    /// Lowercase name, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "full" => Ok(Self::Full),
            other => Err(AppError::validation(format!("Unknown capacity tier: '{other}'"))),
        }
    }
}
