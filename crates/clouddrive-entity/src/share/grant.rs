//! Direct grant entity model.

use chrono::{DateTime, Utc};
use clouddrive_core::types::id::{GrantId, ResourceId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::permission::Role;

/// A persisted permission edge from a user to a resource.
///
/// Applies to the resource and every current and future descendant until a
/// closer grant takes over. Unique per (`resource_id`, `grantee_user_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// Unique grant identifier.
    pub id: GrantId,
    /// The resource the grant is attached to.
    pub resource_id: ResourceId,
    /// The user receiving access.
    pub grantee_user_id: UserId,
    /// Viewer or editor.
    pub role: Role,
    /// The user who created the grant.
    pub granted_by: UserId,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}
