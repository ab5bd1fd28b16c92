//! Core type definitions used across the schedule workspace.

pub mod id;
pub mod slot;

pub use id::*;
pub use slot::{Slot, TimeOfDay, Weekday};
