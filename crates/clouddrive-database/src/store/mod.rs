//! Repository traits shared by every store backend.
//!
//! Each mutating method is one atomic unit: the PostgreSQL repositories run
//! it in a SERIALIZABLE transaction, the in-memory store under its write
//! lock. Structural checks happen inside that unit, before any row changes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{GrantId, LinkShareId, ResourceId, UserId};
use clouddrive_core::types::pagination::{PageRequest, PageResponse};
use clouddrive_entity::permission::Role;
use clouddrive_entity::resource::{NewResource, Resource, ResourceChanges, TrashSummary};
use clouddrive_entity::share::{Grant, LinkShare, NewLinkShare};

/// Rows of the resource tree.
#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    /// Find a resource by ID, trashed or not.
    async fn find_by_id(&self, id: ResourceId) -> AppResult<Option<Resource>>;

    /// Ancestors of `id`, immediate parent first and root last. Empty for a
    /// root-level or missing resource. Stops early on a corrupt cycle.
    async fn find_ancestors(&self, id: ResourceId) -> AppResult<Vec<Resource>>;

    /// Direct children of every listed parent, trashed or not.
    async fn find_children(&self, parent_ids: &[ResourceId]) -> AppResult<Vec<Resource>>;

    /// Active root-level items of a user.
    async fn find_roots(&self, owner_id: UserId) -> AppResult<Vec<Resource>>;

    /// Insert a resource after validating its parent.
    async fn insert(&self, data: NewResource, now: DateTime<Utc>) -> AppResult<Resource>;

    /// Rename and/or re-parent an active resource. The new name and the
    /// destination are both validated before anything is written, so a
    /// rejected change leaves the row untouched.
    async fn update(
        &self,
        id: ResourceId,
        changes: &ResourceChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Resource>;

    /// Soft delete `id` and every descendant not already deleted. Returns
    /// the IDs that were marked.
    async fn mark_deleted(&self, id: ResourceId, now: DateTime<Utc>) -> AppResult<Vec<ResourceId>>;

    /// Clear the soft-delete marker on `id` only. A no-op for an active
    /// resource.
    async fn clear_deleted(
        &self,
        id: ResourceId,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Resource>;

    /// Hard delete a trashed resource with its subtree, grants, and link
    /// shares. With `deleted_before` set the resource must have been trashed
    /// at or before that instant. Returns the purged IDs; empty when the
    /// resource is already gone.
    async fn purge_subtree(
        &self,
        id: ResourceId,
        deleted_before: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<ResourceId>>;

    /// Top-level trash items of a user, most recently deleted first. An item
    /// is top-level when its parent is absent or active.
    async fn find_trashed(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Resource>>;

    /// Count and size of a user's trash.
    async fn trash_summary(&self, owner_id: UserId) -> AppResult<TrashSummary>;

    /// Top-level trash items deleted at or before `deleted_before`.
    async fn find_purgeable(
        &self,
        deleted_before: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<ResourceId>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> AppResult<()>;
}

/// Direct user grants.
#[async_trait]
pub trait GrantStore: Send + Sync + 'static {
    /// Find a grant by ID.
    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>>;

    /// Grants attached directly to a resource.
    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>>;

    /// Grants held by `grantee` on any of the listed resources.
    async fn find_for_grantee(
        &self,
        grantee: UserId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<Grant>>;

    /// Insert or replace the grant for (`resource_id`, `grantee`).
    ///
    /// The resource is read in the same atomic unit: a missing resource is
    /// `NoAccess` and a grantee who owns it is `SelfGrant`.
    async fn upsert(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
        granted_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Grant>;

    /// Change the role of an existing grant. `None` when there is no grant.
    async fn update_role(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
    ) -> AppResult<Option<Grant>>;

    /// Remove the grant for (`resource_id`, `grantee`). Returns whether a row
    /// was removed.
    async fn delete(&self, resource_id: ResourceId, grantee: UserId) -> AppResult<bool>;
}

/// Public link shares.
#[async_trait]
pub trait LinkShareStore: Send + Sync + 'static {
    /// Find a link by ID.
    async fn find_by_id(&self, id: LinkShareId) -> AppResult<Option<LinkShare>>;

    /// Find a link by token, revoked or not.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<LinkShare>>;

    /// Links attached to a resource, newest first.
    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<LinkShare>>;

    /// Store a new link. Fails with `Conflict` when the token is taken.
    async fn insert(&self, data: NewLinkShare, now: DateTime<Utc>) -> AppResult<LinkShare>;

    /// Mark a link revoked. Keeps the first revocation time. `None` when the
    /// link does not exist.
    async fn revoke(&self, id: LinkShareId, now: DateTime<Utc>) -> AppResult<Option<LinkShare>>;
}

/// The three stores a running service uses, behind trait objects so the
/// backend can be chosen from configuration.
#[derive(Clone)]
pub struct Stores {
    /// Resource tree rows.
    pub resources: Arc<dyn ResourceStore>,
    /// Grant rows.
    pub grants: Arc<dyn GrantStore>,
    /// Link share rows.
    pub links: Arc<dyn LinkShareStore>,
}

impl Stores {
    /// Use one value for all three stores.
    pub fn from_single<S>(store: Arc<S>) -> Self
    where
        S: ResourceStore + GrantStore + LinkShareStore,
    {
        Self {
            resources: store.clone(),
            grants: store.clone(),
            links: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
