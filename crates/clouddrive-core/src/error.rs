//! Unified application error types for CloudDrive.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Authorization denials are modelled as
//! values by the resolver and only become an [`AppError`] at the service
//! boundary.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// The caller could not be identified (missing or invalid bearer token).
    Authentication,
    /// Input validation failed.
    Validation,
    /// The parent of a new resource is missing, deleted, or a file.
    InvalidParent,
    /// A move would make a folder its own descendant.
    CycleDetected,
    /// A grant was addressed to the owner of the resource.
    SelfGrant,
    /// The principal has no path to the resource for the requested action.
    NoAccess,
    /// The resource or one of its ancestors is in the trash.
    ResourceDeleted,
    /// A restore was attempted while an ancestor is still in the trash.
    AncestorDeleted,
    /// The retention window of a trashed resource has elapsed.
    RetentionExpired,
    /// The presented link token does not exist.
    InvalidToken,
    /// The link share has expired.
    Expired,
    /// The link share was revoked.
    Revoked,
    /// The link share password did not match.
    WrongPassword,
    /// A conflict occurred (duplicate entry, state precondition, etc.).
    Conflict,
    /// The store was unreachable or a transaction kept conflicting.
    ResolutionFailed,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResolutionFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::InvalidParent => write!(f, "INVALID_PARENT"),
            Self::CycleDetected => write!(f, "CYCLE_DETECTED"),
            Self::SelfGrant => write!(f, "SELF_GRANT"),
            Self::NoAccess => write!(f, "NO_ACCESS"),
            Self::ResourceDeleted => write!(f, "RESOURCE_DELETED"),
            Self::AncestorDeleted => write!(f, "ANCESTOR_DELETED"),
            Self::RetentionExpired => write!(f, "RETENTION_EXPIRED"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Revoked => write!(f, "REVOKED"),
            Self::WrongPassword => write!(f, "WRONG_PASSWORD"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::ResolutionFailed => write!(f, "RESOLUTION_FAILED"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout CloudDrive.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an invalid-parent error.
    pub fn invalid_parent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParent, message)
    }

    /// Create a cycle-detected error.
    pub fn cycle_detected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CycleDetected, message)
    }

    /// Create a self-grant error.
    pub fn self_grant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SelfGrant, message)
    }

    /// Create an ancestor-deleted error.
    pub fn ancestor_deleted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AncestorDeleted, message)
    }

    /// Create a retention-expired error.
    pub fn retention_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RetentionExpired, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a resolution-failed (retryable infrastructure) error.
    pub fn resolution_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResolutionFailed, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller may retry the failed request.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
