//! Convenience result type alias for TaskGo.

use crate::error::AppError;

/// A specialized `Result` type for TaskGo operations.
pub type AppResult<T> = Result<T, AppError>;
