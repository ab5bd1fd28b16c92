//! # schedule-entity
//!
//! Domain entity models for the weekly schedule. `Session` is the only
//! entity the engine owns; `Trainer` and `SessionType` are reference
//! entities owned by an external directory and only ever read.

pub mod capacity;
pub mod directory;
pub mod session;

pub use capacity::CapacityTier;
pub use directory::{SessionType, Trainer};
pub use session::{Session, SessionFlags, SessionStatus};
