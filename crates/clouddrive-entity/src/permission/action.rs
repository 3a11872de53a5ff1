//! Actions checked by the authorization resolver.

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Operations a principal can attempt on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // -- Viewer --
    /// Read metadata.
    Read,
    /// List folder contents.
    List,
    /// Download content.
    Download,

    // -- Editor --
    /// Rename the resource.
    Rename,
    /// Move the resource, or move something into this folder.
    Move,
    /// Replace file content.
    UploadVersion,
    /// Create a child inside this folder.
    CreateChild,
    /// Soft delete into the trash.
    Delete,

    // -- Owner --
    /// Add or change a direct grant, or create a link share.
    Grant,
    /// Remove a direct grant or a link share.
    Revoke,
    /// Remove from the trash for good.
    PermanentDelete,
    /// Bring back from the trash.
    Restore,
}

impl Action {
    /// The weakest role that permits this action.
    pub fn required_role(&self) -> Role {
        match self {
            Self::Read | Self::List | Self::Download => Role::Viewer,
            Self::Rename | Self::Move | Self::UploadVersion | Self::CreateChild | Self::Delete => {
                Role::Editor
            }
            Self::Grant | Self::Revoke | Self::PermanentDelete | Self::Restore => Role::Owner,
        }
    }

    /// Check if the action may run against a trashed resource.
    pub fn applies_to_trash(&self) -> bool {
        matches!(self, Self::Restore | Self::PermanentDelete)
    }

    /// Return the action as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::List => "list",
            Self::Download => "download",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::UploadVersion => "upload_version",
            Self::CreateChild => "create_child",
            Self::Delete => "delete",
            Self::Grant => "grant",
            Self::Revoke => "revoke",
            Self::PermanentDelete => "permanent_delete",
            Self::Restore => "restore",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mapping() {
        assert_eq!(Action::Download.required_role(), Role::Viewer);
        assert_eq!(Action::Delete.required_role(), Role::Editor);
        assert_eq!(Action::CreateChild.required_role(), Role::Editor);
        assert_eq!(Action::Restore.required_role(), Role::Owner);
        assert_eq!(Action::Grant.required_role(), Role::Owner);
    }

    #[test]
    fn test_links_never_reach_owner_actions() {
        for action in [Action::Grant, Action::Revoke, Action::PermanentDelete, Action::Restore] {
            assert!(!Role::Editor.has_at_least(action.required_role()));
        }
    }
}
