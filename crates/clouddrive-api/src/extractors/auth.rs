//! Caller identity extractors.
//!
//! [`AuthUser`] requires a bearer token. [`Caller`] also admits anonymous
//! link holders presenting `X-Share-Token` (and `X-Share-Password`).

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use clouddrive_core::error::AppError;
use clouddrive_core::types::id::UserId;
use clouddrive_entity::principal::Principal;
use clouddrive_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying a link share token.
pub const SHARE_TOKEN_HEADER: &str = "x-share-token";
/// Header carrying a link share password.
pub const SHARE_PASSWORD_HEADER: &str = "x-share-password";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_user(parts, state)
            .await?
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;
        Ok(AuthUser(RequestContext::user(user)))
    }
}

/// A signed-in user, an anonymous link holder, or a user also holding a link.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

impl std::ops::Deref for Caller {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut principal = Principal {
            user_id: bearer_user(parts, state).await?,
            link: None,
        };
        if let Some(token) = header_str(&parts.headers, SHARE_TOKEN_HEADER) {
            let password = header_str(&parts.headers, SHARE_PASSWORD_HEADER).map(String::from);
            principal = principal.with_link(token, password);
        }

        if principal.is_anonymous() {
            return Err(AppError::authentication("Sign in or present a share link").into());
        }
        Ok(Caller(RequestContext::new(principal)))
    }
}

/// Decode the bearer token, if one was sent.
///
/// A missing header is `None`; a malformed or invalid one is an error.
async fn bearer_user(parts: &mut Parts, state: &AppState) -> Result<Option<UserId>, ApiError> {
    let header =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(rejection) if rejection.is_missing() => return Ok(None),
            Err(_) => {
                return Err(AppError::authentication("Invalid Authorization header format").into());
            }
        };

    let claims = state.jwt_decoder.decode(header.token())?;
    Ok(Some(claims.user_id()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
