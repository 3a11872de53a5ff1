//! Structural checks shared by the store backends.
//!
//! Backends load the rows inside their atomic unit and call these before
//! mutating anything.

use chrono::{DateTime, Duration, Utc};

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{ResourceId, UserId};
use clouddrive_entity::permission::DenyReason;
use clouddrive_entity::resource::{Resource, TrashState};

const MAX_NAME_LEN: usize = 255;

/// Trim and check a display name.
pub fn normalize_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(AppError::validation("Name contains invalid characters"));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("Name is reserved"));
    }
    Ok(name.to_string())
}

/// A resource counts as deleted when it or any ancestor carries a marker.
pub fn is_effectively_deleted(resource: &Resource, ancestors: &[Resource]) -> bool {
    resource.is_deleted() || ancestors.iter().any(Resource::is_deleted)
}

/// Resolve a resource that must exist and be active.
pub fn require_active(resource: Option<Resource>, ancestors: &[Resource]) -> AppResult<Resource> {
    match resource {
        Some(r) if !is_effectively_deleted(&r, ancestors) => Ok(r),
        _ => Err(AppError::not_found("Resource not found")),
    }
}

/// Validate the parent of a resource about to be created.
pub fn check_create_parent(
    parent_id: ResourceId,
    parent: Option<&Resource>,
    parent_ancestors: &[Resource],
) -> AppResult<()> {
    let Some(parent) = parent else {
        return Err(AppError::invalid_parent(format!(
            "Parent folder {parent_id} does not exist"
        )));
    };
    if !parent.is_folder() {
        return Err(AppError::invalid_parent("Files cannot contain other items"));
    }
    if is_effectively_deleted(parent, parent_ancestors) {
        return Err(AppError::invalid_parent("Parent folder is in the trash"));
    }
    Ok(())
}

/// Validate a move of `resource` under `target` (`None` for the root).
///
/// `target` carries the new parent and its ancestors. The caller resolves a
/// missing target to `NotFound` before calling.
pub fn check_move(
    resource: &Resource,
    target: Option<(&Resource, &[Resource])>,
    has_trashed_descendants: bool,
) -> AppResult<()> {
    if let Some((parent, parent_ancestors)) = target {
        if is_effectively_deleted(parent, parent_ancestors) {
            return Err(AppError::not_found("Destination folder not found"));
        }
        if parent.id == resource.id || parent_ancestors.iter().any(|a| a.id == resource.id) {
            return Err(AppError::cycle_detected(
                "A folder cannot be moved into itself or its descendants",
            ));
        }
        if !parent.is_folder() {
            return Err(AppError::invalid_parent("Files cannot contain other items"));
        }
    }
    if has_trashed_descendants {
        return Err(AppError::conflict(
            "Folder contains items in the trash; restore or delete them before moving",
        ));
    }
    Ok(())
}

/// Validate the target of a new grant. A resource purged since the caller
/// was authorized reads as `NoAccess`.
pub fn check_grantee(resource: Option<&Resource>, grantee: UserId) -> AppResult<()> {
    let Some(resource) = resource else {
        return Err(DenyReason::NoAccess.into_error());
    };
    if resource.is_owned_by(grantee) {
        return Err(AppError::self_grant(
            "The owner already has full access to this item",
        ));
    }
    Ok(())
}

/// What a restore should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStep {
    /// The resource is not trashed.
    AlreadyActive,
    /// Clear the marker.
    Clear,
}

/// Validate a restore. Retention is checked before ancestry.
pub fn check_restore(
    resource: &Resource,
    ancestors: &[Resource],
    retention: Duration,
    now: DateTime<Utc>,
) -> AppResult<RestoreStep> {
    match TrashState::of(resource.deleted_at, retention, now) {
        TrashState::Active => Ok(RestoreStep::AlreadyActive),
        TrashState::Expired => Err(AppError::retention_expired(
            "The retention period for this item has elapsed",
        )),
        TrashState::Recoverable => {
            if ancestors.iter().any(Resource::is_deleted) {
                return Err(AppError::ancestor_deleted(
                    "Restore the containing folder first",
                ));
            }
            Ok(RestoreStep::Clear)
        }
    }
}

/// Validate a purge of `resource`.
pub fn check_purge(resource: &Resource, deleted_before: Option<DateTime<Utc>>) -> AppResult<()> {
    let Some(deleted_at) = resource.deleted_at else {
        return Err(AppError::conflict(
            "Only items in the trash can be permanently deleted",
        ));
    };
    if let Some(cutoff) = deleted_before {
        if deleted_at > cutoff {
            return Err(AppError::conflict("The retention period has not elapsed"));
        }
    }
    Ok(())
}
