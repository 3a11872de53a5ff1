//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use clouddrive_core::error::{AppError, ErrorKind};

/// Message shared by every "cannot see it" answer so that missing and
/// forbidden resources look the same.
const NOT_FOUND_MESSAGE: &str = "Resource not found";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether retrying with backoff may succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub retryable: bool,
}

/// Handler error: an [`AppError`] on its way to becoming a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP status and wire code for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::NotFound | ErrorKind::NoAccess => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::InvalidParent => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PARENT"),
        ErrorKind::SelfGrant => (StatusCode::UNPROCESSABLE_ENTITY, "SELF_GRANT"),
        ErrorKind::CycleDetected => (StatusCode::CONFLICT, "CYCLE_DETECTED"),
        ErrorKind::AncestorDeleted => (StatusCode::CONFLICT, "ANCESTOR_DELETED"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::ResourceDeleted => (StatusCode::GONE, "RESOURCE_DELETED"),
        ErrorKind::RetentionExpired => (StatusCode::GONE, "RETENTION_EXPIRED"),
        ErrorKind::InvalidToken | ErrorKind::Expired | ErrorKind::Revoked => {
            (StatusCode::NOT_FOUND, "LINK_UNAVAILABLE")
        }
        ErrorKind::WrongPassword => (StatusCode::UNAUTHORIZED, "WRONG_PASSWORD"),
        ErrorKind::ResolutionFailed => (StatusCode::SERVICE_UNAVAILABLE, "RESOLUTION_FAILED"),
        ErrorKind::Configuration | ErrorKind::Serialization | ErrorKind::Internal => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, code) = status_for(err.kind);

        let message = match err.kind {
            ErrorKind::NotFound | ErrorKind::NoAccess => NOT_FOUND_MESSAGE.to_string(),
            ErrorKind::Configuration | ErrorKind::Serialization | ErrorKind::Internal => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            ErrorKind::ResolutionFailed => {
                tracing::warn!(error = %err, "Store unavailable");
                err.message.clone()
            }
            _ => err.message.clone(),
        };

        let body = ApiErrorResponse {
            error: code.to_string(),
            message,
            retryable: err.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_and_no_access_identical() {
        let a = ApiError(AppError::not_found("Folder 42 is missing")).into_response();
        let b = ApiError(AppError::new(ErrorKind::NoAccess, "Access denied")).into_response();
        assert_eq!(a.status(), b.status());
        assert_eq!(a.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_link_failures_share_status() {
        for kind in [ErrorKind::InvalidToken, ErrorKind::Expired, ErrorKind::Revoked] {
            assert_eq!(status_for(kind), (StatusCode::NOT_FOUND, "LINK_UNAVAILABLE"));
        }
        assert_eq!(status_for(ErrorKind::ResolutionFailed).0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
