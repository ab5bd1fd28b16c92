//! Weekly grid configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::{Slot, TimeOfDay};

/// Bounds of the bookable weekly grid.
///
/// Rows run from `first_slot` to `last_slot` inclusive in steps of
/// `slot_minutes`; columns are always Monday..Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Earliest time row.
    #[serde(default = "default_first_slot")]
    pub first_slot: TimeOfDay,
    /// Latest time row.
    #[serde(default = "default_last_slot")]
    pub last_slot: TimeOfDay,
    /// Row spacing in minutes.
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u16,
    /// Reject move targets that are not a grid row.
    #[serde(default = "default_true")]
    pub strict: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            first_slot: default_first_slot(),
            last_slot: default_last_slot(),
            slot_minutes: default_slot_minutes(),
            strict: true,
        }
    }
}

impl GridConfig {
    /// Check that the bounds describe at least one row.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.slot_minutes == 0 {
            return Err(AppError::configuration("grid.slot_minutes must be positive"));
        }
        if self.first_slot > self.last_slot {
            return Err(AppError::configuration(format!(
                "grid.first_slot {} is after grid.last_slot {}",
                self.first_slot, self.last_slot
            )));
        }
        Ok(())
    }

    /// The time rows of the grid, earliest first.
    pub fn times(&self) -> Vec<TimeOfDay> {
        let step = self.slot_minutes.max(1);
        (self.first_slot.minutes()..=self.last_slot.minutes())
            .step_by(usize::from(step))
            .filter_map(|m| TimeOfDay::from_minutes(m).ok())
            .collect()
    }

    /// Whether a slot falls on one of the grid rows.
    pub fn contains(&self, slot: &Slot) -> bool {
        let m = slot.time.minutes();
        m >= self.first_slot.minutes()
            && m <= self.last_slot.minutes()
            && (m - self.first_slot.minutes()) % self.slot_minutes.max(1) == 0
    }

    /// Validate a placement target under the configured strictness.
    pub fn check_target(&self, slot: &Slot) -> Result<(), AppError> {
        if self.strict && !self.contains(slot) {
            return Err(AppError::validation(format!(
                "Slot {slot} is outside the weekly grid ({}..{} every {} min)",
                self.first_slot, self.last_slot, self.slot_minutes
            )));
        }
        Ok(())
    }
}

fn default_first_slot() -> TimeOfDay {
    TimeOfDay::on_the_hour(6)
}

fn default_last_slot() -> TimeOfDay {
    TimeOfDay::on_the_hour(22)
}

fn default_slot_minutes() -> u16 {
    60
}

fn default_true() -> bool {
    true
}
