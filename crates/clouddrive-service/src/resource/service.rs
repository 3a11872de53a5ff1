//! Folder and file operations on behalf of a caller.

use std::sync::Arc;

use serde::Serialize;

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::ResourceId;
use clouddrive_database::store::ResourceStore;
use clouddrive_entity::permission::{Action, Decision, DenyReason, Role};
use clouddrive_entity::resource::{NewResource, Resource, ResourceChanges};

use crate::access::AccessService;
use crate::context::RequestContext;
use crate::tree::TreeService;

/// A resource together with the caller's effective role on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    /// The resource row.
    #[serde(flatten)]
    pub resource: Resource,
    /// The caller's role.
    pub role: Role,
}

/// Input for registering a file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub name: String,
    /// Containing folder, or `None` for the caller's root.
    pub folder_id: Option<ResourceId>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// MIME type.
    pub mime_type: Option<String>,
}

/// Authorized browsing and editing of the resource tree.
#[derive(Clone)]
pub struct ResourceService {
    resources: Arc<dyn ResourceStore>,
    tree: Arc<TreeService>,
    access: Arc<AccessService>,
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService").finish_non_exhaustive()
    }
}

impl ResourceService {
    /// Creates a new resource service.
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        tree: Arc<TreeService>,
        access: Arc<AccessService>,
    ) -> Self {
        Self {
            resources,
            tree,
            access,
        }
    }

    /// Fetch a resource the caller can read.
    pub async fn get(&self, ctx: &RequestContext, id: ResourceId) -> AppResult<ResourceView> {
        let role = self.access.require(ctx, id, Action::Read).await?;
        let resource = self
            .resources
            .find_by_id(id)
            .await?
            .ok_or_else(|| DenyReason::NoAccess.into_error())?;
        Ok(ResourceView { resource, role })
    }

    /// Create a folder owned by the caller.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<ResourceId>,
    ) -> AppResult<Resource> {
        let user = ctx.require_user()?;
        if let Some(parent) = parent_id {
            self.require_parent(ctx, parent, trashed_parent()).await?;
        }
        self.tree
            .create(NewResource::folder(name, user, parent_id))
            .await
    }

    /// Register a file record owned by the caller.
    pub async fn create_file(&self, ctx: &RequestContext, file: NewFile) -> AppResult<Resource> {
        let user = ctx.require_user()?;
        if file.size_bytes < 0 {
            return Err(AppError::validation(
                "sizeBytes must not be negative",
            ));
        }
        if let Some(parent) = file.folder_id {
            self.require_parent(ctx, parent, trashed_parent()).await?;
        }
        self.tree
            .create(NewResource::file(
                file.name,
                user,
                file.folder_id,
                file.size_bytes,
                file.mime_type,
            ))
            .await
    }

    /// Rename and/or move a resource.
    ///
    /// Every access check runs before the single store write: `Rename` for
    /// a new name, `Move` for a new parent plus `CreateChild` on the
    /// destination. Moving to the root needs the owner role.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
        changes: &ResourceChanges,
    ) -> AppResult<Resource> {
        if changes.is_empty() {
            return Err(AppError::validation("Provide name and/or parentId"));
        }
        if changes.name.is_some() {
            self.access.require(ctx, id, Action::Rename).await?;
        }
        if let Some(new_parent_id) = changes.parent_id {
            let role = self.access.require(ctx, id, Action::Move).await?;
            match new_parent_id {
                Some(parent) if parent != id => {
                    let trashed = AppError::not_found("Destination folder not found");
                    self.require_parent(ctx, parent, trashed).await?;
                }
                Some(_) => {}
                None if role == Role::Owner => {}
                None => return Err(DenyReason::NoAccess.into_error()),
            }
        }
        self.tree.update(id, changes).await
    }

    /// Active children of a folder, folders first then by name.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        folder_id: ResourceId,
    ) -> AppResult<Vec<Resource>> {
        self.access.require(ctx, folder_id, Action::List).await?;
        let mut children: Vec<Resource> = self
            .tree
            .children(folder_id)
            .await?
            .into_iter()
            .filter(|r| !r.is_deleted())
            .collect();
        children.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        Ok(children)
    }

    /// The caller's active root-level items.
    pub async fn list_roots(&self, ctx: &RequestContext) -> AppResult<Vec<Resource>> {
        let user = ctx.require_user()?;
        self.resources.find_roots(user).await
    }

    /// Path from the highest readable ancestor down to the resource itself.
    pub async fn breadcrumb(
        &self,
        ctx: &RequestContext,
        id: ResourceId,
    ) -> AppResult<Vec<Resource>> {
        let target = self.get(ctx, id).await?.resource;
        let mut trail = vec![target];
        for ancestor in self.tree.ancestors(id).await? {
            if !self
                .access
                .decide(ctx, ancestor.id, Action::Read)
                .await?
                .is_allowed()
            {
                break;
            }
            trail.push(ancestor);
        }
        trail.reverse();
        Ok(trail)
    }

    /// Check `CreateChild` on a destination folder. A trashed destination
    /// reports `trashed` instead of the access denial.
    async fn require_parent(
        &self,
        ctx: &RequestContext,
        parent: ResourceId,
        trashed: AppError,
    ) -> AppResult<()> {
        match self.access.decide(ctx, parent, Action::CreateChild).await? {
            Decision::Denied(DenyReason::ResourceDeleted) => Err(trashed),
            decision => decision.into_result().map(|_| ()),
        }
    }
}

fn trashed_parent() -> AppError {
    AppError::invalid_parent("Parent folder is in the trash")
}
