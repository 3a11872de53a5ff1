//! Access roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access role on a resource.
///
/// Totally ordered by privilege: Owner > Editor > Viewer. The derived
/// `Ord` follows declaration order, so keep the variants ascending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "access_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read, list, and download.
    Viewer,
    /// Viewer rights plus content and structure changes.
    Editor,
    /// Full control. Derived from ownership, never stored on a grant.
    Owner,
}

impl Role {
    /// Check if this role grants at least `required`.
    pub fn has_at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Check if the role may be stored on a grant or a link share.
    pub fn is_delegable(&self) -> bool {
        !matches!(self, Self::Owner)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = clouddrive_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "owner" => Ok(Self::Owner),
            _ => Err(clouddrive_core::AppError::validation(format!(
                "Invalid role: '{s}'"
            ))),
        }
    }
}
