//! Authorization checks at the service boundary.
//!
//! The resolver returns denials as values; this is where they turn into
//! errors.

use std::sync::Arc;

use clouddrive_auth::AuthorizationResolver;
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::permission::{Action, Decision, Role};

use crate::context::RequestContext;

/// Checks a caller's access to a resource.
#[derive(Debug, Clone)]
pub struct AccessService {
    resolver: Arc<AuthorizationResolver>,
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(resolver: Arc<AuthorizationResolver>) -> Self {
        Self { resolver }
    }

    /// The raw decision, without converting denials.
    pub async fn decide(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
        action: Action,
    ) -> AppResult<Decision> {
        self.resolver
            .resolve(&ctx.principal, resource_id, action)
            .await
    }

    /// The caller's effective role, or the denial as an error.
    pub async fn require(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
        action: Action,
    ) -> AppResult<Role> {
        self.decide(ctx, resource_id, action).await?.into_result()
    }
}
