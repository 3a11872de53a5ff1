//! # clouddrive-core
//!
//! Core crate for CloudDrive. Contains configuration schemas, typed
//! identifiers, the clock abstraction, pagination types, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other CloudDrive crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
