//! Request context carrying the caller's identity.

use serde::{Deserialize, Serialize};

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::UserId;
use clouddrive_entity::principal::Principal;

/// Context for the current request.
///
/// Built by the HTTP layer from the bearer token and link headers, then
/// passed explicitly into every service call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Who is asking.
    pub principal: Principal,
}

impl RequestContext {
    /// Creates a context for `principal`.
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    /// Context for a signed-in user.
    pub fn user(user_id: UserId) -> Self {
        Self::new(Principal::user(user_id))
    }

    /// Context for an anonymous link holder.
    pub fn link(token: impl Into<String>, password: Option<String>) -> Self {
        Self::new(Principal::anonymous_link(token, password))
    }

    /// The signed-in user, or `Authentication` for anonymous callers.
    pub fn require_user(&self) -> AppResult<UserId> {
        self.principal
            .user_id
            .ok_or_else(|| AppError::authentication("Sign in required"))
    }
}
