//! Public link share registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use clouddrive_auth::{LinkVerifier, PasswordHasher, TokenGenerator};
use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_core::types::id::{LinkShareId, ResourceId};
use clouddrive_database::guard;
use clouddrive_database::store::{LinkShareStore, ResourceStore};
use clouddrive_entity::permission::{Action, DenyReason, Role};
use clouddrive_entity::resource::Resource;
use clouddrive_entity::share::{LinkShare, NewLinkShare};

use crate::access::AccessService;
use crate::context::RequestContext;

/// Request to create a link share.
#[derive(Debug, Clone)]
pub struct NewLink {
    /// The shared resource.
    pub resource_id: ResourceId,
    /// Viewer (default) or editor.
    pub role: Option<Role>,
    /// Optional expiry; must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional password.
    pub password: Option<String>,
}

/// A link that resolved, with the resource it opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    /// The link row.
    pub link: LinkShare,
    /// The shared resource.
    pub resource: Resource,
}

/// Creates, resolves, lists, and revokes link shares.
#[derive(Clone)]
pub struct LinkShareRegistry {
    links: Arc<dyn LinkShareStore>,
    resources: Arc<dyn ResourceStore>,
    access: Arc<AccessService>,
    verifier: Arc<LinkVerifier>,
    tokens: TokenGenerator,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    token_attempts: u32,
}

impl std::fmt::Debug for LinkShareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkShareRegistry")
            .field("tokens", &self.tokens)
            .field("token_attempts", &self.token_attempts)
            .finish_non_exhaustive()
    }
}

impl LinkShareRegistry {
    /// Creates a new registry.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        links: Arc<dyn LinkShareStore>,
        resources: Arc<dyn ResourceStore>,
        access: Arc<AccessService>,
        verifier: Arc<LinkVerifier>,
        tokens: TokenGenerator,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
        token_attempts: u32,
    ) -> Self {
        Self {
            links,
            resources,
            access,
            verifier,
            tokens,
            hasher,
            clock,
            token_attempts: token_attempts.max(1),
        }
    }

    /// Create a link on a resource the caller owns.
    pub async fn create(&self, ctx: &RequestContext, req: NewLink) -> AppResult<LinkShare> {
        let created_by = ctx.require_user()?;
        self.access.require(ctx, req.resource_id, Action::Grant).await?;

        let role = req.role.unwrap_or(Role::Viewer);
        if !role.is_delegable() {
            return Err(AppError::validation("Links can only grant viewer or editor access"));
        }
        let now = self.clock.now();
        if req.expires_at.is_some_and(|at| at <= now) {
            return Err(AppError::validation("Expiry must be in the future"));
        }
        let password_hash = match req.password.as_deref() {
            Some("") => return Err(AppError::validation("Password must not be empty")),
            Some(password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };

        for attempt in 1..=self.token_attempts {
            let data = NewLinkShare {
                token: self.tokens.generate(),
                resource_id: req.resource_id,
                role,
                password_hash: password_hash.clone(),
                expires_at: req.expires_at,
                created_by,
            };
            match self.links.insert(data, now).await {
                Ok(link) => {
                    info!(
                        link_id = %link.id,
                        resource_id = %link.resource_id,
                        role = %link.role,
                        protected = link.has_password(),
                        expires_at = ?link.expires_at,
                        "Link share created"
                    );
                    return Ok(link);
                }
                Err(err) if err.kind == ErrorKind::Conflict => {
                    warn!(attempt, "Link token collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }
        Err(AppError::internal("Could not allocate a unique link token"))
    }

    /// Resolve presented credentials to the link and its resource.
    ///
    /// A link whose resource is in the trash reports `ResourceDeleted`.
    pub async fn resolve(&self, token: &str, password: Option<&str>) -> AppResult<ResolvedLink> {
        let link = self
            .verifier
            .verify(token, password)
            .await?
            .map_err(DenyReason::into_error)?;

        let resource = self
            .resources
            .find_by_id(link.resource_id)
            .await?
            .ok_or_else(|| DenyReason::InvalidToken.into_error())?;
        let ancestors = self.resources.find_ancestors(resource.id).await?;
        if guard::is_effectively_deleted(&resource, &ancestors) {
            return Err(DenyReason::ResourceDeleted.into_error());
        }
        Ok(ResolvedLink { link, resource })
    }

    /// Revoke a link. Revoking twice keeps the first revocation time.
    pub async fn revoke(&self, ctx: &RequestContext, link_id: LinkShareId) -> AppResult<LinkShare> {
        ctx.require_user()?;
        let link = self
            .links
            .find_by_id(link_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link share not found"))?;
        self.access.require(ctx, link.resource_id, Action::Revoke).await?;

        let revoked = self
            .links
            .revoke(link_id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::not_found("Link share not found"))?;
        info!(link_id = %link_id, resource_id = %revoked.resource_id, "Link share revoked");
        Ok(revoked)
    }

    /// Links on a resource. Tokens are visible only to those who may share.
    pub async fn list_for_resource(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
    ) -> AppResult<Vec<LinkShare>> {
        self.access.require(ctx, resource_id, Action::Grant).await?;
        self.links.find_for_resource(resource_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Services;
    use chrono::Duration;
    use clouddrive_core::types::id::UserId;

    async fn shared_folder(svc: &Services) -> (RequestContext, Resource) {
        let ctx = RequestContext::user(UserId::new());
        let folder = svc.resources.create_folder(&ctx, "Photos", None).await.unwrap();
        (ctx, folder)
    }

    fn link_on(resource_id: ResourceId, password: Option<&str>) -> NewLink {
        NewLink {
            resource_id,
            role: None,
            expires_at: None,
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_password_link_scenario() {
        let (svc, _clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;
        let link = svc.links.create(&ctx, link_on(folder.id, Some("x1"))).await.unwrap();
        assert_eq!(link.role, Role::Viewer);

        let err = svc.links.resolve(&link.token, Some("nope")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongPassword);

        let resolved = svc.links.resolve(&link.token, Some("x1")).await.unwrap();
        assert_eq!(resolved.resource.id, folder.id);
        assert_eq!(resolved.link.role, Role::Viewer);

        svc.links.revoke(&ctx, link.id).await.unwrap();
        let err = svc.links.resolve(&link.token, Some("x1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Revoked);
    }

    #[tokio::test]
    async fn test_expired_link_never_resolves() {
        let (svc, clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;
        let mut req = link_on(folder.id, Some("x1"));
        req.expires_at = Some(clock.now() + Duration::hours(1));
        let link = svc.links.create(&ctx, req).await.unwrap();

        clock.advance(Duration::hours(1));
        let err = svc.links.resolve(&link.token, Some("x1")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_owner_role_and_past_expiry_rejected() {
        let (svc, clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;

        let mut req = link_on(folder.id, None);
        req.role = Some(Role::Owner);
        let err = svc.links.create(&ctx, req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut req = link_on(folder.id, None);
        req.expires_at = Some(clock.now() - Duration::minutes(1));
        let err = svc.links.create(&ctx, req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_tokens_are_unique_and_url_safe() {
        let (svc, _clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;
        let a = svc.links.create(&ctx, link_on(folder.id, None)).await.unwrap();
        let b = svc.links.create(&ctx, link_on(folder.id, None)).await.unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), b.token.len());
        assert!(a.token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let listed = svc.links.list_for_resource(&ctx, folder.id).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_link_on_trashed_resource() {
        let (svc, _clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;
        let link = svc.links.create(&ctx, link_on(folder.id, None)).await.unwrap();
        svc.trash.soft_delete(&ctx, folder.id).await.unwrap();

        let err = svc.links.resolve(&link.token, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceDeleted);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_list_links() {
        let (svc, _clock) = Services::for_tests();
        let (ctx, folder) = shared_folder(&svc).await;
        let viewer = UserId::new();
        svc.grants.grant(&ctx, folder.id, viewer, Role::Viewer).await.unwrap();

        let err = svc
            .links
            .list_for_resource(&RequestContext::user(viewer), folder.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAccess);
    }
}
