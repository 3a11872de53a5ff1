//! HTTP request handlers organized by domain.

pub mod file;
pub mod folder;
pub mod health;
pub mod share;
pub mod trash;

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::resource::{Resource, ResourceChanges, ResourceKind};
use clouddrive_service::context::RequestContext;

use crate::dto::request::UpdateResourceRequest;
use crate::state::AppState;

/// Reject a resource reached through the wrong endpoint family.
///
/// A file id under `/folders` looks exactly like a missing folder.
pub(crate) fn expect_kind(resource: &Resource, kind: ResourceKind) -> AppResult<()> {
    if resource.kind == kind {
        Ok(())
    } else {
        Err(AppError::not_found(format!("{kind} not found")))
    }
}

/// Apply a rename and/or move as one change, returning the final row.
pub(crate) async fn update_resource(
    state: &AppState,
    ctx: &RequestContext,
    id: ResourceId,
    kind: ResourceKind,
    req: UpdateResourceRequest,
) -> AppResult<Resource> {
    let services = &state.services;
    let current = services.resources.get(ctx, id).await?.resource;
    expect_kind(&current, kind)?;

    let changes = ResourceChanges {
        name: req.name,
        parent_id: req.parent_id.map(|p| p.map(ResourceId::from_uuid)),
    };
    services.resources.update(ctx, id, &changes).await
}
