//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clouddrive_core::types::id::{GrantId, LinkShareId, ResourceId, UserId};
use clouddrive_entity::permission::Role;
use clouddrive_entity::resource::Resource;
use clouddrive_entity::share::{Grant, LinkShare};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// One row of the shared-users panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    /// Grant id; absent for the owner row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<GrantId>,
    /// The user with access.
    pub user_id: UserId,
    /// Their role.
    pub role: Role,
    /// When access was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AccessEntry {
    /// The owner row.
    pub fn owner(resource: &Resource) -> Self {
        Self {
            id: None,
            user_id: resource.owner_id,
            role: Role::Owner,
            created_at: None,
        }
    }
}

impl From<Grant> for AccessEntry {
    fn from(grant: Grant) -> Self {
        Self {
            id: Some(grant.id),
            user_id: grant.grantee_user_id,
            role: grant.role,
            created_at: Some(grant.created_at),
        }
    }
}

/// Everyone with access to a resource, plus its link shares.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharesResponse {
    /// The resource.
    pub resource_id: ResourceId,
    /// Owner first, then direct grants.
    pub entries: Vec<AccessEntry>,
    /// Link shares; only shown to callers who may share.
    pub links: Vec<LinkResponse>,
}

/// A link share as returned to its creator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Link id.
    pub id: LinkShareId,
    /// URL token.
    pub token: String,
    /// Shared resource.
    pub resource_id: ResourceId,
    /// Viewer or editor.
    pub role: Role,
    /// Whether a password is required.
    pub has_password: bool,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Revocation time.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<LinkShare> for LinkResponse {
    fn from(link: LinkShare) -> Self {
        Self {
            has_password: link.has_password(),
            id: link.id,
            token: link.token,
            resource_id: link.resource_id,
            role: link.role,
            expires_at: link.expires_at,
            created_at: link.created_at,
            revoked_at: link.revoked_at,
        }
    }
}

/// A resolved link: what it grants and on what.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLinkResponse {
    /// Role the link grants.
    pub role: Role,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// The shared resource.
    pub resource: Resource,
}

/// Result of a delete-style operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedResponse {
    /// Number of resources affected.
    pub affected: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Whether the store answered.
    pub store: bool,
}
