//! # schedule-core
//!
//! Core crate for the weekly schedule engine. Contains the collaborator
//! traits, configuration schemas, typed identifiers, domain events,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other schedule crates.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use context::CommandContext;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
