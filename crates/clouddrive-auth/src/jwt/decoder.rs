//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use clouddrive_core::config::auth::AuthConfig;
use clouddrive_core::error::AppError;

use super::claims::Claims;

/// Validates bearer tokens signed with the shared HMAC secret.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.jwt_leeway_seconds;
        if !config.jwt_issuer.is_empty() {
            validation.set_issuer(&[config.jwt_issuer.as_str()]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use clouddrive_core::error::ErrorKind;
    use clouddrive_core::types::id::UserId;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_roundtrip_subject() {
        let user = UserId::new();
        let token = JwtEncoder::new(&config())
            .issue(user, chrono::Duration::minutes(5))
            .unwrap();
        let claims = JwtDecoder::new(&config()).decode(&token).unwrap();
        assert_eq!(claims.user_id(), user);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtEncoder::new(&config())
            .issue(UserId::new(), chrono::Duration::minutes(5))
            .unwrap();
        let other = AuthConfig {
            jwt_secret: "other".to_string(),
            ..AuthConfig::default()
        };
        let err = JwtDecoder::new(&other).decode(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_expired_rejected() {
        let token = JwtEncoder::new(&config())
            .issue(UserId::new(), chrono::Duration::hours(-2))
            .unwrap();
        let err = JwtDecoder::new(&config()).decode(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }
}
