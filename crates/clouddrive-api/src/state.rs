//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use clouddrive_auth::JwtDecoder;
use clouddrive_core::config::AppConfig;
use clouddrive_service::Services;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// JWT decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Business services
    pub services: Services,
}

impl AppState {
    /// Creates the state from its parts.
    pub fn new(config: Arc<AppConfig>, jwt_decoder: Arc<JwtDecoder>, services: Services) -> Self {
        Self {
            config,
            jwt_decoder,
            services,
        }
    }
}
