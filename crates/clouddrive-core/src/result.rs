//! Convenience result type alias for CloudDrive.

use crate::error::AppError;

/// A specialized `Result` type for CloudDrive operations.
pub type AppResult<T> = Result<T, AppError>;
