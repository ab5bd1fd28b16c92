//! Week-at-a-glance layout of the schedule.

use serde::Serialize;

use schedule_core::config::GridConfig;
use schedule_core::types::{Slot, TimeOfDay, Weekday};
use schedule_entity::Session;

use crate::registry::SessionRegistry;

/// One cell of the weekly grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub slot: Slot,
    /// Sessions in the cell, in arrival order.
    pub sessions: Vec<Session>,
}

/// The whole week: one row per configured time, one column per day.
#[derive(Debug, Clone, Serialize)]
pub struct WeekGrid {
    /// Row labels, earliest first.
    pub times: Vec<TimeOfDay>,
    /// Cells in row-major order (time, then Monday..Sunday).
    pub cells: Vec<GridCell>,
    /// Sessions whose slot is not a grid row, e.g. legacy data loaded
    /// from the store.
    pub off_grid: Vec<Session>,
}

impl WeekGrid {
    /// Lay out a registry on the configured grid.
    pub fn build(config: &GridConfig, registry: &SessionRegistry) -> Self {
        let times = config.times();
        let cells = times
            .iter()
            .flat_map(|time| Weekday::ALL.iter().map(move |day| Slot::new(*day, *time)))
            .map(|slot| GridCell {
                slot,
                sessions: registry.sessions_at(&slot).into_iter().cloned().collect(),
            })
            .collect();
        let off_grid = registry
            .iter_ordered()
            .filter(|s| !config.contains(&s.slot))
            .cloned()
            .collect();

        Self {
            times,
            cells,
            off_grid,
        }
    }

    /// The cell for a slot, if the slot is on the grid.
    pub fn cell(&self, slot: &Slot) -> Option<&GridCell> {
        let row = self.times.iter().position(|t| *t == slot.time)?;
        let col = Weekday::ALL.iter().position(|d| *d == slot.day)?;
        self.cells.get(row * Weekday::ALL.len() + col)
    }

    /// The seven cells of one time row.
    pub fn row(&self, time: TimeOfDay) -> &[GridCell] {
        let width = Weekday::ALL.len();
        match self.times.iter().position(|t| *t == time) {
            Some(row) => &self.cells[row * width..(row + 1) * width],
            None => &[],
        }
    }

    /// Number of sessions on the grid plus those off it.
    pub fn session_count(&self) -> usize {
        self.cells.iter().map(|c| c.sessions.len()).sum::<usize>() + self.off_grid.len()
    }
}
