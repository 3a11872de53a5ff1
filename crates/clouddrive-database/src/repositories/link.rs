//! Link share repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{LinkShareId, ResourceId};
use clouddrive_entity::share::{LinkShare, NewLinkShare};

use crate::store::LinkShareStore;

/// Repository for public link shares.
#[derive(Debug, Clone)]
pub struct LinkShareRepository {
    pool: PgPool,
}

impl LinkShareRepository {
    /// Create a new link share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkShareStore for LinkShareRepository {
    async fn find_by_id(&self, id: LinkShareId) -> AppResult<Option<LinkShare>> {
        sqlx::query_as::<_, LinkShare>("SELECT * FROM link_shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ResolutionFailed, "Failed to find link", e))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<LinkShare>> {
        sqlx::query_as::<_, LinkShare>("SELECT * FROM link_shares WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ResolutionFailed, "Failed to find link by token", e)
            })
    }

    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<LinkShare>> {
        sqlx::query_as::<_, LinkShare>(
            "SELECT * FROM link_shares WHERE resource_id = $1 ORDER BY created_at DESC",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ResolutionFailed, "Failed to list links", e))
    }

    async fn insert(&self, data: NewLinkShare, now: DateTime<Utc>) -> AppResult<LinkShare> {
        let row = data.into_link(LinkShareId::new(), now);
        sqlx::query_as::<_, LinkShare>(
            "INSERT INTO link_shares \
             (id, token, resource_id, role, password_hash, expires_at, created_by, created_at, revoked_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL) RETURNING *",
        )
        .bind(row.id)
        .bind(&row.token)
        .bind(row.resource_id)
        .bind(row.role)
        .bind(&row.password_hash)
        .bind(row.expires_at)
        .bind(row.created_by)
        .bind(row.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                AppError::with_source(ErrorKind::Conflict, "Link token already in use", e)
            } else {
                AppError::with_source(ErrorKind::ResolutionFailed, "Failed to create link", e)
            }
        })
    }

    async fn revoke(&self, id: LinkShareId, now: DateTime<Utc>) -> AppResult<Option<LinkShare>> {
        sqlx::query_as::<_, LinkShare>(
            "UPDATE link_shares SET revoked_at = COALESCE(revoked_at, $2) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ResolutionFailed, "Failed to revoke link", e))
    }
}
