//! # clouddrive-api
//!
//! HTTP API layer for CloudDrive built on Axum.
//!
//! Provides the REST endpoints for folders, files, sharing, and the trash,
//! together with middleware (CORS, request logging), extractors, DTOs, and
//! error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
