//! Trash lifecycle: `Active -> SoftDeleted -> Purged`, with restore back to
//! `Active` inside the retention window.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_core::types::id::ResourceId;
use clouddrive_core::types::pagination::PageRequest;
use clouddrive_database::store::ResourceStore;
use clouddrive_entity::permission::Action;
use clouddrive_entity::resource::{Resource, TrashSummary, days_remaining};

use super::listing::{TrashItem, TrashListing, location_of};
use crate::access::AccessService;
use crate::context::RequestContext;

/// Page size used when emptying a whole trash.
const EMPTY_BATCH: u64 = 200;

/// Soft deletes, restores, and purges resources.
#[derive(Clone)]
pub struct TrashService {
    resources: Arc<dyn ResourceStore>,
    access: Arc<AccessService>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl std::fmt::Debug for TrashService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrashService")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl TrashService {
    /// Creates a new trash service.
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        access: Arc<AccessService>,
        clock: Arc<dyn Clock>,
        retention: Duration,
    ) -> Self {
        Self {
            resources,
            access,
            clock,
            retention,
        }
    }

    /// The configured retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Move a resource and its active descendants to the trash. Returns
    /// every ID that was marked.
    pub async fn soft_delete(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
    ) -> AppResult<Vec<ResourceId>> {
        self.access.require(ctx, resource_id, Action::Delete).await?;
        let marked = self
            .resources
            .mark_deleted(resource_id, self.clock.now())
            .await?;
        info!(
            resource_id = %resource_id,
            user_id = ?ctx.principal.user_id,
            cascaded = marked.len().saturating_sub(1),
            "Resource moved to trash"
        );
        Ok(marked)
    }

    /// Bring a resource back from the trash.
    ///
    /// Fails with `RetentionExpired` once the window has passed and with
    /// `AncestorDeleted` while a containing folder is still trashed. Only the
    /// resource itself is cleared; its trashed children become top-level
    /// trash items.
    pub async fn restore(&self, ctx: &RequestContext, resource_id: ResourceId) -> AppResult<Resource> {
        self.access.require(ctx, resource_id, Action::Restore).await?;
        let restored = self
            .resources
            .clear_deleted(resource_id, self.retention, self.clock.now())
            .await?;
        info!(
            resource_id = %resource_id,
            user_id = ?ctx.principal.user_id,
            "Resource restored"
        );
        Ok(restored)
    }

    /// Hard delete a trashed resource whose retention has elapsed.
    ///
    /// System call with no access check. Purging an absent ID is a no-op.
    pub async fn purge(&self, resource_id: ResourceId) -> AppResult<Vec<ResourceId>> {
        let cutoff = self.clock.now() - self.retention;
        let purged = self
            .resources
            .purge_subtree(resource_id, Some(cutoff))
            .await?;
        if !purged.is_empty() {
            info!(resource_id = %resource_id, count = purged.len(), "Resource purged");
        }
        Ok(purged)
    }

    /// Purge up to `batch` expired top-level trash items. Returns how many
    /// resources were removed in total.
    pub async fn purge_expired(&self, batch: u32) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.retention;
        let due = self.resources.find_purgeable(cutoff, batch).await?;
        let mut removed = 0u64;
        for id in due {
            match self.purge(id).await {
                Ok(ids) => removed += ids.len() as u64,
                // One bad row must not stall the rest of the sweep.
                Err(err) if !err.is_retryable() => {
                    warn!(resource_id = %id, error = %err, "Skipping resource during purge");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(removed)
    }

    /// Delete a trashed item for good ahead of its retention deadline.
    pub async fn permanent_delete(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
    ) -> AppResult<Vec<ResourceId>> {
        self.access
            .require(ctx, resource_id, Action::PermanentDelete)
            .await?;
        let purged = self.resources.purge_subtree(resource_id, None).await?;
        info!(
            resource_id = %resource_id,
            user_id = ?ctx.principal.user_id,
            count = purged.len(),
            "Resource permanently deleted"
        );
        Ok(purged)
    }

    /// Permanently delete every top-level trash item the caller owns.
    pub async fn empty_trash(&self, ctx: &RequestContext) -> AppResult<u64> {
        let user = ctx.require_user()?;
        let page = PageRequest::new(EMPTY_BATCH, 0);
        let mut removed = 0u64;
        loop {
            let batch = self.resources.find_trashed(user, page).await?;
            if batch.items.is_empty() {
                break;
            }
            let mut progressed = false;
            for item in batch.items {
                let purged = self.resources.purge_subtree(item.id, None).await?;
                progressed |= !purged.is_empty();
                removed += purged.len() as u64;
            }
            if !progressed {
                break;
            }
        }
        info!(user_id = %user, count = removed, "Trash emptied");
        Ok(removed)
    }

    /// Whole days left before `resource` is purged. Zero for active ones.
    pub fn days_remaining(&self, resource: &Resource) -> i64 {
        resource
            .deleted_at
            .map(|at| days_remaining(at, self.retention, self.clock.now()))
            .unwrap_or(0)
    }

    /// The caller's top-level trash items, most recently deleted first.
    pub async fn list_trash(&self, ctx: &RequestContext, page: PageRequest) -> AppResult<TrashListing> {
        let user = ctx.require_user()?;
        let page = page.normalized();
        let found = self.resources.find_trashed(user, page).await?;
        let summary = self.resources.trash_summary(user).await?;

        let mut items = Vec::with_capacity(found.items.len());
        for resource in found.items {
            let ancestors = self.resources.find_ancestors(resource.id).await?;
            items.push(TrashItem {
                days_remaining: self.days_remaining(&resource),
                original_location: location_of(&ancestors),
                resource,
            });
        }

        Ok(TrashListing {
            items,
            total: found.total,
            limit: found.limit,
            offset: found.offset,
            has_more: found.has_more,
            total_size_bytes: summary.total_size_bytes,
            retention_days: u32::try_from(self.retention.num_days()).unwrap_or(u32::MAX),
        })
    }

    /// Count and size of the caller's trash.
    pub async fn summary(&self, ctx: &RequestContext) -> AppResult<TrashSummary> {
        let user = ctx.require_user()?;
        self.resources.trash_summary(user).await
    }
}
