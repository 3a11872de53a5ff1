//! Request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use clouddrive_entity::permission::Role;
use clouddrive_entity::resource::ResourceKind;

/// Create folder request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder (`None` for the caller's root).
    pub parent_id: Option<Uuid>,
}

/// Register a file record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitFileRequest {
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size_bytes: i64,
    /// Containing folder (`None` for the caller's root).
    pub folder_id: Option<Uuid>,
}

/// Rename and/or move a file or folder.
///
/// `parentId: null` moves the item to the owner's root; omitting the field
/// leaves it where it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    /// New name.
    pub name: Option<String>,
    /// New parent.
    #[serde(default, alias = "folderId", deserialize_with = "present")]
    pub parent_id: Option<Option<Uuid>>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Grant direct access to a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrantRequest {
    /// `"file"` or `"folder"`.
    pub resource_type: ResourceKind,
    /// Target resource.
    pub resource_id: Uuid,
    /// User receiving access.
    pub grantee_user_id: Uuid,
    /// Viewer or editor.
    pub role: Role,
}

/// Change the role on an existing grant.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGrantRequest {
    /// Viewer or editor.
    pub role: Role,
}

/// Create a public link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    /// `"file"` or `"folder"`.
    pub resource_type: ResourceKind,
    /// Target resource.
    pub resource_id: Uuid,
    /// Viewer (default) or editor.
    pub role: Option<Role>,
    /// When the link stops working.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional password.
    pub password: Option<String>,
}

/// Query string for resolving a link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveLinkQuery {
    /// Password for protected links.
    pub password: Option<String>,
}
