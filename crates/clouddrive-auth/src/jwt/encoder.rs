//! JWT token signing.
//!
//! Production tokens come from the identity provider; the encoder serves
//! local development and tests that share the provider's secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use clouddrive_core::config::auth::AuthConfig;
use clouddrive_core::error::AppError;
use clouddrive_core::types::id::UserId;

use super::claims::Claims;

/// Signs access tokens with the shared HMAC secret.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    issuer: Option<String>,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: (!config.jwt_issuer.is_empty()).then(|| config.jwt_issuer.clone()),
        }
    }

    /// Issue a token for `user` valid for `ttl`.
    pub fn issue(&self, user: UserId, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.into_uuid(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }
}
