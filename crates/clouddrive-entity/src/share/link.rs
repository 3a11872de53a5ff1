//! Public link share entity model.

use chrono::{DateTime, Utc};
use clouddrive_core::types::id::{LinkShareId, ResourceId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::permission::{DenyReason, Role};

/// A tokenized access path to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LinkShare {
    /// Unique link identifier.
    pub id: LinkShareId,
    /// Unguessable URL-safe token.
    pub token: String,
    /// The shared resource.
    pub resource_id: ResourceId,
    /// Ceiling on what the link permits (viewer or editor).
    pub role: Role,
    /// Argon2 PHC string when the link is password protected.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// When the link stops working.
    pub expires_at: Option<DateTime<Utc>>,
    /// The user who created the link.
    pub created_by: UserId,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
    /// When the link was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl LinkShare {
    /// Check if the link requires a password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check if the link was revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check if the link has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Why the link cannot be used at `now`, ignoring the password.
    ///
    /// Revocation is reported before expiry.
    pub fn unusable_reason(&self, now: DateTime<Utc>) -> Option<DenyReason> {
        if self.is_revoked() {
            Some(DenyReason::Revoked)
        } else if self.is_expired(now) {
            Some(DenyReason::Expired)
        } else {
            None
        }
    }
}

/// Data required to create a new link share.
#[derive(Debug, Clone)]
pub struct NewLinkShare {
    /// Pre-generated token.
    pub token: String,
    /// The shared resource.
    pub resource_id: ResourceId,
    /// Viewer or editor.
    pub role: Role,
    /// Pre-hashed password.
    pub password_hash: Option<String>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// The creating user.
    pub created_by: UserId,
}

impl NewLinkShare {
    /// Materialize the row that will be stored.
    pub fn into_link(self, id: LinkShareId, now: DateTime<Utc>) -> LinkShare {
        LinkShare {
            id,
            token: self.token,
            resource_id: self.resource_id,
            role: self.role,
            password_hash: self.password_hash,
            expires_at: self.expires_at,
            created_by: self.created_by,
            created_at: now,
            revoked_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> LinkShare {
        NewLinkShare {
            token: "tok".to_string(),
            resource_id: ResourceId::new(),
            role: Role::Viewer,
            password_hash: Some("$argon2id$...".to_string()),
            expires_at,
            created_by: UserId::new(),
        }
        .into_link(LinkShareId::new(), Utc::now())
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let l = link(Some(now));
        assert!(l.is_expired(now));
        assert!(!l.is_expired(now - Duration::seconds(1)));
        assert!(!link(None).is_expired(now + Duration::days(3650)));
    }

    #[test]
    fn test_revoked_reported_first() {
        let now = Utc::now();
        let mut l = link(Some(now - Duration::days(1)));
        assert_eq!(l.unusable_reason(now), Some(DenyReason::Expired));
        l.revoked_at = Some(now);
        assert_eq!(l.unusable_reason(now), Some(DenyReason::Revoked));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(link(None)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("token").is_some());
    }
}
