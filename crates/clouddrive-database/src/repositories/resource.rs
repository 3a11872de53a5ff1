//! Resource tree repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{ResourceId, UserId, to_uuids};
use clouddrive_core::types::pagination::{PageRequest, PageResponse};
use clouddrive_entity::resource::{NewResource, Resource, ResourceChanges, TrashSummary};

use crate::guard::{self, RestoreStep};
use crate::store::ResourceStore;

use super::tx::{TxError, run_serializable};

const COLUMNS: &str = "id, kind, owner_id, parent_id, name, size_bytes, mime_type, \
                       created_at, modified_at, deleted_at, deleted_directly";

/// Top-level trash items: trashed rows whose parent is absent or active.
const TRASH_ROOTS: &str = "FROM resources r LEFT JOIN resources p ON p.id = r.parent_id \
                           WHERE r.deleted_at IS NOT NULL AND (p.id IS NULL OR p.deleted_at IS NULL)";

/// Repository for the resource tree.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    pool: PgPool,
    max_retries: u32,
}

impl ResourceRepository {
    /// Create a new resource repository.
    pub fn new(pool: PgPool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }
}

pub(super) async fn fetch(
    conn: &mut PgConnection,
    id: ResourceId,
) -> Result<Option<Resource>, sqlx::Error> {
    sqlx::query_as::<_, Resource>(&format!("SELECT {COLUMNS} FROM resources WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Parent first. The visited array stops the walk on a corrupt cycle.
async fn fetch_ancestors(
    conn: &mut PgConnection,
    id: ResourceId,
) -> Result<Vec<Resource>, sqlx::Error> {
    let sql = format!(
        "WITH RECURSIVE chain AS ( \
             SELECT p.*, 1 AS depth, ARRAY[c.id, p.id] AS visited \
             FROM resources c JOIN resources p ON p.id = c.parent_id \
             WHERE c.id = $1 \
           UNION ALL \
             SELECT p.*, chain.depth + 1, chain.visited || p.id \
             FROM chain JOIN resources p ON p.id = chain.parent_id \
             WHERE NOT p.id = ANY(chain.visited) \
         ) \
         SELECT {COLUMNS} FROM chain ORDER BY depth"
    );
    sqlx::query_as::<_, Resource>(&sql)
        .bind(id)
        .fetch_all(conn)
        .await
}

/// `id` and every descendant.
const SUBTREE: &str = "WITH RECURSIVE sub AS ( \
                           SELECT id, deleted_at, ARRAY[id] AS visited FROM resources WHERE id = $1 \
                         UNION ALL \
                           SELECT r.id, r.deleted_at, sub.visited || r.id \
                           FROM resources r JOIN sub ON r.parent_id = sub.id \
                           WHERE NOT r.id = ANY(sub.visited) \
                       )";

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::ResolutionFailed, message, e)
}

#[async_trait]
impl ResourceStore for ResourceRepository {
    async fn find_by_id(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        fetch(&mut conn, id)
            .await
            .map_err(db_error("Failed to find resource"))
    }

    async fn find_ancestors(&self, id: ResourceId) -> AppResult<Vec<Resource>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))?;
        fetch_ancestors(&mut conn, id)
            .await
            .map_err(db_error("Failed to load ancestors"))
    }

    async fn find_children(&self, parent_ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {COLUMNS} FROM resources WHERE parent_id = ANY($1) ORDER BY kind, name"
        ))
        .bind(to_uuids(parent_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list children"))
    }

    async fn find_roots(&self, owner_id: UserId) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {COLUMNS} FROM resources \
             WHERE owner_id = $1 AND parent_id IS NULL AND deleted_at IS NULL \
             ORDER BY kind, name"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list root items"))
    }

    async fn insert(&self, data: NewResource, now: DateTime<Utc>) -> AppResult<Resource> {
        run_serializable(&self.pool, self.max_retries, "create resource", move |conn| {
            let data = data.clone();
            Box::pin(async move {
                if let Some(parent_id) = data.parent_id {
                    let parent = fetch(&mut *conn, parent_id).await?;
                    let chain = fetch_ancestors(&mut *conn, parent_id).await?;
                    guard::check_create_parent(parent_id, parent.as_ref(), &chain)?;
                }
                let row = data.into_resource(ResourceId::new(), now);
                let created = sqlx::query_as::<_, Resource>(&format!(
                    "INSERT INTO resources ({COLUMNS}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
                ))
                .bind(row.id)
                .bind(row.kind)
                .bind(row.owner_id)
                .bind(row.parent_id)
                .bind(&row.name)
                .bind(row.size_bytes)
                .bind(&row.mime_type)
                .bind(row.created_at)
                .bind(row.modified_at)
                .bind(row.deleted_at)
                .bind(row.deleted_directly)
                .fetch_one(&mut *conn)
                .await?;
                Ok(created)
            })
        })
        .await
    }

    async fn update(
        &self,
        id: ResourceId,
        changes: &ResourceChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Resource> {
        let name = changes.name.as_deref().map(guard::normalize_name).transpose()?;
        let new_parent = changes.parent_id;
        run_serializable(&self.pool, self.max_retries, "update resource", move |conn| {
            let name = name.clone();
            Box::pin(async move {
                let chain = fetch_ancestors(&mut *conn, id).await?;
                let resource = guard::require_active(fetch(&mut *conn, id).await?, &chain)?;

                if let Some(new_parent_id) = new_parent {
                    let target = match new_parent_id {
                        Some(pid) => {
                            let parent = fetch(&mut *conn, pid).await?.ok_or_else(|| {
                                AppError::not_found("Destination folder not found")
                            })?;
                            Some((parent, fetch_ancestors(&mut *conn, pid).await?))
                        }
                        None => None,
                    };
                    let trashed_below: bool = sqlx::query_scalar(&format!(
                        "{SUBTREE} SELECT EXISTS (SELECT 1 FROM sub WHERE id <> $1 AND deleted_at IS NOT NULL)"
                    ))
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;
                    guard::check_move(
                        &resource,
                        target.as_ref().map(|(p, a)| (p, a.as_slice())),
                        trashed_below,
                    )?;
                }

                let updated = sqlx::query_as::<_, Resource>(&format!(
                    "UPDATE resources SET \
                       name = COALESCE($2, name), \
                       parent_id = CASE WHEN $3 THEN $4 ELSE parent_id END, \
                       modified_at = $5 \
                     WHERE id = $1 RETURNING {COLUMNS}"
                ))
                .bind(id)
                .bind(name.as_deref())
                .bind(new_parent.is_some())
                .bind(new_parent.flatten())
                .bind(now)
                .fetch_one(&mut *conn)
                .await?;
                Ok(updated)
            })
        })
        .await
    }

    async fn mark_deleted(&self, id: ResourceId, now: DateTime<Utc>) -> AppResult<Vec<ResourceId>> {
        let marked = run_serializable(&self.pool, self.max_retries, "delete resource", move |conn| {
            Box::pin(async move {
                let chain = fetch_ancestors(&mut *conn, id).await?;
                let target = fetch(&mut *conn, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Resource not found"))?;
                if guard::is_effectively_deleted(&target, &chain) {
                    return Err(TxError::App(AppError::new(
                        ErrorKind::ResourceDeleted,
                        "Resource is already in the trash",
                    )));
                }
                let ids: Vec<ResourceId> = sqlx::query_scalar(&format!(
                    "{SUBTREE} UPDATE resources r \
                     SET deleted_at = $2, deleted_directly = (r.id = $1) \
                     FROM sub WHERE r.id = sub.id AND r.deleted_at IS NULL \
                     RETURNING r.id"
                ))
                .bind(id)
                .bind(now)
                .fetch_all(&mut *conn)
                .await?;
                Ok(ids)
            })
        })
        .await?;
        debug!(resource_id = %id, count = marked.len(), "Marked subtree deleted");
        Ok(marked)
    }

    async fn clear_deleted(
        &self,
        id: ResourceId,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Resource> {
        run_serializable(&self.pool, self.max_retries, "restore resource", move |conn| {
            Box::pin(async move {
                let resource = fetch(&mut *conn, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Resource not found"))?;
                let chain = fetch_ancestors(&mut *conn, id).await?;
                if guard::check_restore(&resource, &chain, retention, now)? == RestoreStep::AlreadyActive
                {
                    return Ok(resource);
                }
                let restored = sqlx::query_as::<_, Resource>(&format!(
                    "UPDATE resources SET deleted_at = NULL, deleted_directly = FALSE \
                     WHERE id = $1 RETURNING {COLUMNS}"
                ))
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
                Ok(restored)
            })
        })
        .await
    }

    async fn purge_subtree(
        &self,
        id: ResourceId,
        deleted_before: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<ResourceId>> {
        run_serializable(&self.pool, self.max_retries, "purge resource", move |conn| {
            Box::pin(async move {
                let Some(root) = fetch(&mut *conn, id).await? else {
                    return Ok(Vec::new());
                };
                guard::check_purge(&root, deleted_before)?;

                let ids: Vec<Uuid> = sqlx::query_scalar(&format!("{SUBTREE} SELECT id FROM sub"))
                    .bind(id)
                    .fetch_all(&mut *conn)
                    .await?;

                sqlx::query("DELETE FROM grants WHERE resource_id = ANY($1)")
                    .bind(&ids)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("DELETE FROM link_shares WHERE resource_id = ANY($1)")
                    .bind(&ids)
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("DELETE FROM resources WHERE id = ANY($1)")
                    .bind(&ids)
                    .execute(&mut *conn)
                    .await?;

                Ok(ids.into_iter().map(ResourceId::from_uuid).collect())
            })
        })
        .await
    }

    async fn find_trashed(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Resource>> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {TRASH_ROOTS} AND r.owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count trash"))?;

        let items = sqlx::query_as::<_, Resource>(&format!(
            "SELECT r.* {TRASH_ROOTS} AND r.owner_id = $1 \
             ORDER BY r.deleted_at DESC, r.name LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(page.limit_i64())
        .bind(page.offset_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list trash"))?;

        Ok(PageResponse::new(items, page, total.max(0) as u64))
    }

    async fn trash_summary(&self, owner_id: UserId) -> AppResult<TrashSummary> {
        let item_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {TRASH_ROOTS} AND r.owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count trash"))?;

        let total_size_bytes: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM resources \
             WHERE owner_id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to sum trash size"))?;

        Ok(TrashSummary {
            item_count: item_count.max(0) as u64,
            total_size_bytes,
        })
    }

    async fn find_purgeable(
        &self,
        deleted_before: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<ResourceId>> {
        sqlx::query_scalar::<_, ResourceId>(&format!(
            "SELECT r.id {TRASH_ROOTS} AND r.deleted_at <= $1 ORDER BY r.deleted_at LIMIT $2"
        ))
        .bind(deleted_before)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find purgeable items"))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error("Health check failed"))
    }
}
