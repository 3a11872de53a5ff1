//! Resource (folder or file) entity model.

use chrono::{DateTime, Utc};
use clouddrive_core::types::id::{ResourceId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Whether a resource is a folder or a file.
///
/// Orders folders before files, matching the database enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "resource_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A folder; the only kind that may have children.
    Folder,
    /// A file.
    File,
}

impl ResourceKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = clouddrive_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "file" => Ok(Self::File),
            _ => Err(clouddrive_core::AppError::validation(format!(
                "Invalid resource type: '{s}'"
            ))),
        }
    }
}

/// A node in the resource tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Unique resource identifier.
    pub id: ResourceId,
    /// Folder or file.
    pub kind: ResourceKind,
    /// The creating user. Never changes on move.
    pub owner_id: UserId,
    /// Parent folder (None for root-level items of the owner).
    pub parent_id: Option<ResourceId>,
    /// Display name.
    pub name: String,
    /// File size in bytes (files only).
    pub size_bytes: Option<i64>,
    /// MIME type (files only).
    pub mime_type: Option<String>,
    /// When the resource was created.
    pub created_at: DateTime<Utc>,
    /// Last rename or move.
    pub modified_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Set only on the resource a soft delete was aimed at.
    pub deleted_directly: bool,
}

impl Resource {
    /// Check if this resource can hold children.
    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    /// Check if the resource itself carries a soft-delete marker.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if this is a root-level item.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if `user` owns this resource.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Data required to create a new resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    /// Folder or file.
    pub kind: ResourceKind,
    /// Display name.
    pub name: String,
    /// The creating user.
    pub owner_id: UserId,
    /// Parent folder (None for root level).
    pub parent_id: Option<ResourceId>,
    /// File size (files only).
    pub size_bytes: Option<i64>,
    /// MIME type (files only).
    pub mime_type: Option<String>,
}

impl NewResource {
    /// A new folder.
    pub fn folder(name: impl Into<String>, owner_id: UserId, parent_id: Option<ResourceId>) -> Self {
        Self {
            kind: ResourceKind::Folder,
            name: name.into(),
            owner_id,
            parent_id,
            size_bytes: None,
            mime_type: None,
        }
    }

    /// A new file record.
    pub fn file(
        name: impl Into<String>,
        owner_id: UserId,
        parent_id: Option<ResourceId>,
        size_bytes: i64,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::File,
            name: name.into(),
            owner_id,
            parent_id,
            size_bytes: Some(size_bytes),
            mime_type,
        }
    }

    /// Materialize the row that will be stored.
    pub fn into_resource(self, id: ResourceId, now: DateTime<Utc>) -> Resource {
        Resource {
            id,
            kind: self.kind,
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            name: self.name,
            size_bytes: self.size_bytes,
            mime_type: self.mime_type,
            created_at: now,
            modified_at: now,
            deleted_at: None,
            deleted_directly: false,
        }
    }
}

/// Edits applied to an existing resource in one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceChanges {
    /// New display name.
    pub name: Option<String>,
    /// New parent. `Some(None)` moves to the owner's root.
    pub parent_id: Option<Option<ResourceId>>,
}

impl ResourceChanges {
    /// Only a new name.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_id: None,
        }
    }

    /// Only a new parent.
    pub fn move_to(parent_id: Option<ResourceId>) -> Self {
        Self {
            name: None,
            parent_id: Some(parent_id),
        }
    }

    /// Whether nothing would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}
