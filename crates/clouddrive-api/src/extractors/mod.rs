//! Custom Axum extractors.

pub mod auth;
pub mod pagination;

pub use auth::{AuthUser, Caller};
pub use pagination::PaginationParams;
