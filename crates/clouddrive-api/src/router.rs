//! Route definitions for the CloudDrive HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    let api_routes = Router::new()
        .merge(folder_routes())
        .merge(file_routes())
        .merge(share_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Folder CRUD and browsing
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/root", get(handlers::folder::list_root))
        .route(
            "/folders/{id}",
            get(handlers::folder::get_folder)
                .patch(handlers::folder::update_folder)
                .delete(handlers::folder::delete_folder),
        )
        .route("/folders/{id}/children", get(handlers::folder::list_children))
        .route("/folders/{id}/breadcrumb", get(handlers::folder::breadcrumb))
}

/// File records and the trash
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/init", post(handlers::file::init_file))
        .route(
            "/files/trash",
            get(handlers::trash::list_trash).delete(handlers::trash::empty_trash),
        )
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .patch(handlers::file::update_file)
                .delete(handlers::file::delete_file),
        )
        .route("/files/{id}/restore", post(handlers::trash::restore))
        .route(
            "/files/{id}/permanent",
            delete(handlers::trash::permanent_delete),
        )
}

/// Direct grants and link shares
///
/// `{key}` is a grant id on its own and a resource kind when followed by an
/// id; the router needs one parameter name per segment.
fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares", post(handlers::share::create_grant))
        .route("/shares/links", post(handlers::share::create_link))
        .route(
            "/shares/links/{token}",
            get(handlers::share::resolve_link).delete(handlers::share::revoke_link),
        )
        .route(
            "/shares/{key}",
            axum::routing::patch(handlers::share::update_grant)
                .delete(handlers::share::revoke_grant),
        )
        .route("/shares/{key}/{id}", get(handlers::share::list_shares))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}
