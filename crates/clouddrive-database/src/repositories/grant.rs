//! Grant repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{GrantId, ResourceId, UserId, to_uuids};
use clouddrive_entity::permission::Role;
use clouddrive_entity::share::Grant;

use crate::guard;
use crate::store::GrantStore;

use super::resource::fetch;
use super::tx::run_serializable;

/// Repository for direct user grants.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: PgPool,
    max_retries: u32,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>("SELECT * FROM grants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ResolutionFailed, "Failed to find grant", e))
    }

    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE resource_id = $1 ORDER BY created_at",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ResolutionFailed, "Failed to list grants", e))
    }

    async fn find_for_grantee(
        &self,
        grantee: UserId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<Grant>> {
        if resource_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE grantee_user_id = $1 AND resource_id = ANY($2)",
        )
        .bind(grantee)
        .bind(to_uuids(resource_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ResolutionFailed, "Failed to load user grants", e)
        })
    }

    async fn upsert(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
        granted_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Grant> {
        run_serializable(&self.pool, self.max_retries, "save grant", move |conn| {
            Box::pin(async move {
                let resource = fetch(&mut *conn, resource_id).await?;
                guard::check_grantee(resource.as_ref(), grantee)?;
                let grant = sqlx::query_as::<_, Grant>(
                    "INSERT INTO grants (id, resource_id, grantee_user_id, role, granted_by, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (resource_id, grantee_user_id) \
                     DO UPDATE SET role = EXCLUDED.role, granted_by = EXCLUDED.granted_by \
                     RETURNING *",
                )
                .bind(GrantId::new())
                .bind(resource_id)
                .bind(grantee)
                .bind(role)
                .bind(granted_by)
                .bind(now)
                .fetch_one(&mut *conn)
                .await?;
                Ok(grant)
            })
        })
        .await
    }

    async fn update_role(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
    ) -> AppResult<Option<Grant>> {
        sqlx::query_as::<_, Grant>(
            "UPDATE grants SET role = $3 WHERE resource_id = $1 AND grantee_user_id = $2 RETURNING *",
        )
        .bind(resource_id)
        .bind(grantee)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ResolutionFailed, "Failed to change grant role", e)
        })
    }

    async fn delete(&self, resource_id: ResourceId, grantee: UserId) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM grants WHERE resource_id = $1 AND grantee_user_id = $2")
                .bind(resource_id)
                .bind(grantee)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::ResolutionFailed, "Failed to revoke grant", e)
                })?;
        Ok(result.rows_affected() > 0)
    }
}
