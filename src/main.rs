//! CloudDrive Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use clouddrive_api::{AppState, build_router};
use clouddrive_auth::JwtDecoder;
use clouddrive_core::config::AppConfig;
use clouddrive_core::config::database::StoreBackend;
use clouddrive_core::traits::SystemClock;
use clouddrive_database::{MemoryStore, Stores};
use clouddrive_service::Services;
use clouddrive_worker::jobs::purge::TrashPurgeJob;
use clouddrive_worker::{CronScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let env = std::env::var("CLOUDDRIVE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = ?e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting CloudDrive v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store selection + migrations ─────────────────────
    let (stores, db_pool) = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            (Stores::from_single(Arc::new(MemoryStore::new())), None)
        }
        StoreBackend::Postgres => {
            let pool = clouddrive_database::connection::connect(&config.database)
                .await
                .context("Database connection failed")?;
            clouddrive_database::migration::run_migrations(&pool)
                .await
                .context("Migration failed")?;
            let stores = Stores::postgres(pool.clone(), config.database.max_transaction_retries);
            (stores, Some(pool))
        }
    };

    // ── Step 2: Services ─────────────────────────────────────────
    let services = Services::build(stores, &config, Arc::new(SystemClock))
        .context("Service initialization failed")?;
    tracing::info!(
        retention_days = config.trash.retention_days,
        "Services initialized"
    );

    // ── Step 3: Scheduled purge sweep ────────────────────────────
    let scheduler = if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(TrashPurgeJob::new(
            Arc::clone(&services.trash),
            config.trash.purge_batch_size,
        )));
        let executor = Arc::new(executor);

        if config.worker.purge_on_startup {
            match executor.execute(TrashPurgeJob::JOB_TYPE).await {
                Ok(result) => tracing::info!(%result, "Startup purge finished"),
                Err(e) => tracing::warn!(error = %e, "Startup purge failed"),
            }
        }

        let scheduler = CronScheduler::new(Arc::clone(&executor)).await?;
        scheduler
            .register(TrashPurgeJob::JOB_TYPE, &config.trash.purge_schedule)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 4: Build and start HTTP server ──────────────────────
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(Arc::new(config), jwt_decoder, services));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("CloudDrive server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .context("Server error")?;

    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }
    if let Some(pool) = db_pool {
        pool.close().await;
        tracing::info!("Database pool closed");
    }

    tracing::info!("CloudDrive server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
