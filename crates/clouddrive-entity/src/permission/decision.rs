//! Authorization decisions.
//!
//! A denial is a normal outcome, not an error. Services turn a
//! [`Decision::Denied`] into an [`AppError`] only when they need to abort the
//! request.

use clouddrive_core::error::{AppError, ErrorKind};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No ownership, grant, or link covers the action.
    NoAccess,
    /// The resource or an ancestor is in the trash.
    ResourceDeleted,
    /// The presented link token is unknown.
    InvalidToken,
    /// The presented link has expired.
    Expired,
    /// The presented link was revoked.
    Revoked,
    /// The presented link password did not match.
    WrongPassword,
}

impl DenyReason {
    /// The error kind this denial surfaces as.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::NoAccess => ErrorKind::NoAccess,
            Self::ResourceDeleted => ErrorKind::ResourceDeleted,
            Self::InvalidToken => ErrorKind::InvalidToken,
            Self::Expired => ErrorKind::Expired,
            Self::Revoked => ErrorKind::Revoked,
            Self::WrongPassword => ErrorKind::WrongPassword,
        }
    }

    /// Convert into an application error.
    pub fn into_error(self) -> AppError {
        let message = match self {
            Self::NoAccess => "Access denied",
            Self::ResourceDeleted => "Resource is in the trash",
            Self::InvalidToken | Self::Expired | Self::Revoked => "Link invalid or expired",
            Self::WrongPassword => "Incorrect link password",
        };
        AppError::new(self.error_kind(), message)
    }
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        reason.into_error()
    }
}

/// Outcome of resolving a principal's access to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Decision {
    /// Allowed with the effective role.
    Allowed(Role),
    /// Denied for the given reason.
    Denied(DenyReason),
}

impl Decision {
    /// Check if the decision allows the action.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// The effective role, or the denial as an error.
    pub fn into_result(self) -> Result<Role, AppError> {
        match self {
            Self::Allowed(role) => Ok(role),
            Self::Denied(reason) => Err(reason.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        assert_eq!(Decision::Allowed(Role::Viewer).into_result().unwrap(), Role::Viewer);
        let err = Decision::Denied(DenyReason::ResourceDeleted).into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceDeleted);
    }

    #[test]
    fn test_link_failures_share_a_message() {
        let a = DenyReason::Expired.into_error();
        let b = DenyReason::Revoked.into_error();
        assert_eq!(a.message, b.message);
        assert_ne!(a.kind, b.kind);
    }
}
