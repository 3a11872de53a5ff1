//! PostgreSQL pool setup.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use clouddrive_core::config::database::DatabaseConfig;
use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;

/// Open the pool described by `config`.
///
/// The URL is parsed up front so only its host, port, database, and user
/// reach the logs.
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    let options = connect_options(&config.url)?;
    info!(
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        user = options.get_username(),
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect_with(options)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ResolutionFailed, "Failed to connect to database", e)
        })?;
    Ok(pool)
}

fn connect_options(url: &str) -> AppResult<PgConnectOptions> {
    url.parse::<PgConnectOptions>()
        .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid database URL", e))
}
