//! Convenience result type alias for imgshift.

use crate::error::AppError;

/// A specialized `Result` type for imgshift operations.
pub type AppResult<T> = Result<T, AppError>;
