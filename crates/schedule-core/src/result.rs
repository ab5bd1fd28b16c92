//! Convenience result type alias for the schedule engine.

use crate::error::AppError;

/// A specialized `Result` type for schedule operations.
pub type AppResult<T> = Result<T, AppError>;
