//! Direct grant management.

use std::sync::Arc;

use tracing::info;

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_core::types::id::{GrantId, ResourceId, UserId};
use clouddrive_database::store::GrantStore;
use clouddrive_entity::permission::{Action, Role};
use clouddrive_entity::share::Grant;

use crate::access::AccessService;
use crate::context::RequestContext;

/// Creates, changes, lists, and revokes direct grants.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantStore>,
    access: Arc<AccessService>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GrantService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantService").finish_non_exhaustive()
    }
}

impl GrantService {
    /// Creates a new grant service.
    pub fn new(
        grants: Arc<dyn GrantStore>,
        access: Arc<AccessService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            grants,
            access,
            clock,
        }
    }

    /// Grant `role` on a resource to `grantee`, replacing any existing
    /// direct grant for that pair. The store rejects the owner as grantee.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
    ) -> AppResult<Grant> {
        let granted_by = ctx.require_user()?;
        self.access.require(ctx, resource_id, Action::Grant).await?;
        check_delegable(role)?;

        let grant = self
            .grants
            .upsert(resource_id, grantee, role, granted_by, self.clock.now())
            .await?;
        info!(
            grant_id = %grant.id,
            resource_id = %resource_id,
            grantee = %grantee,
            role = %role,
            granted_by = %granted_by,
            "Access granted"
        );
        Ok(grant)
    }

    /// Remove the direct grant for `grantee`. Absent grants are a no-op.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
        grantee: UserId,
    ) -> AppResult<()> {
        ctx.require_user()?;
        self.access.require(ctx, resource_id, Action::Revoke).await?;
        if self.grants.delete(resource_id, grantee).await? {
            info!(resource_id = %resource_id, grantee = %grantee, "Access revoked");
        }
        Ok(())
    }

    /// Remove a grant by its ID. Unknown IDs are a no-op.
    pub async fn revoke_by_id(&self, ctx: &RequestContext, grant_id: GrantId) -> AppResult<()> {
        ctx.require_user()?;
        let Some(grant) = self.grants.find_by_id(grant_id).await? else {
            return Ok(());
        };
        self.revoke(ctx, grant.resource_id, grant.grantee_user_id)
            .await
    }

    /// Change the role of an existing grant. `NotFound` when there is none.
    pub async fn change_role(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
    ) -> AppResult<Grant> {
        ctx.require_user()?;
        self.access.require(ctx, resource_id, Action::Grant).await?;
        check_delegable(role)?;
        let grant = self
            .grants
            .update_role(resource_id, grantee, role)
            .await?
            .ok_or_else(|| AppError::not_found("Grant not found"))?;
        info!(grant_id = %grant.id, role = %role, "Grant role changed");
        Ok(grant)
    }

    /// Change a grant's role by the grant ID.
    pub async fn change_role_by_id(
        &self,
        ctx: &RequestContext,
        grant_id: GrantId,
        role: Role,
    ) -> AppResult<Grant> {
        ctx.require_user()?;
        let grant = self
            .grants
            .find_by_id(grant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Grant not found"))?;
        self.change_role(ctx, grant.resource_id, grant.grantee_user_id, role)
            .await
    }

    /// Direct grants on the resource itself, not inherited ones.
    pub async fn list_for_resource(
        &self,
        ctx: &RequestContext,
        resource_id: ResourceId,
    ) -> AppResult<Vec<Grant>> {
        self.access.require(ctx, resource_id, Action::Read).await?;
        self.grants.find_for_resource(resource_id).await
    }
}

fn check_delegable(role: Role) -> AppResult<()> {
    if role.is_delegable() {
        Ok(())
    } else {
        Err(AppError::validation("Only viewer or editor access can be shared"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Services;
    use clouddrive_core::error::ErrorKind;

    #[tokio::test]
    async fn test_grant_is_upsert() {
        let (svc, _clock) = Services::for_tests();
        let (owner, user) = (UserId::new(), UserId::new());
        let ctx = RequestContext::user(owner);
        let folder = svc.resources.create_folder(&ctx, "F", None).await.unwrap();

        let first = svc.grants.grant(&ctx, folder.id, user, Role::Viewer).await.unwrap();
        let second = svc.grants.grant(&ctx, folder.id, user, Role::Editor).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.role, Role::Editor);

        let listed = svc.grants.list_for_resource(&ctx, folder.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_self_grant_and_owner_role_rejected() {
        let (svc, _clock) = Services::for_tests();
        let owner = UserId::new();
        let ctx = RequestContext::user(owner);
        let folder = svc.resources.create_folder(&ctx, "F", None).await.unwrap();

        let err = svc
            .grants
            .grant(&ctx, folder.id, owner, Role::Viewer)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SelfGrant);

        let err = svc
            .grants
            .grant(&ctx, folder.id, UserId::new(), Role::Owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_only_owner_can_grant() {
        let (svc, _clock) = Services::for_tests();
        let (owner, editor) = (UserId::new(), UserId::new());
        let ctx = RequestContext::user(owner);
        let folder = svc.resources.create_folder(&ctx, "F", None).await.unwrap();
        svc.grants.grant(&ctx, folder.id, editor, Role::Editor).await.unwrap();

        let err = svc
            .grants
            .grant(&RequestContext::user(editor), folder.id, UserId::new(), Role::Viewer)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAccess);
    }

    #[tokio::test]
    async fn test_revoke_absent_is_noop_and_change_role_needs_grant() {
        let (svc, _clock) = Services::for_tests();
        let (owner, user) = (UserId::new(), UserId::new());
        let ctx = RequestContext::user(owner);
        let folder = svc.resources.create_folder(&ctx, "F", None).await.unwrap();

        svc.grants.revoke(&ctx, folder.id, user).await.unwrap();
        svc.grants.revoke_by_id(&ctx, GrantId::new()).await.unwrap();

        let err = svc
            .grants
            .change_role(&ctx, folder.id, user, Role::Editor)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let grant = svc.grants.grant(&ctx, folder.id, user, Role::Viewer).await.unwrap();
        let changed = svc
            .grants
            .change_role_by_id(&ctx, grant.id, Role::Editor)
            .await
            .unwrap();
        assert_eq!(changed.role, Role::Editor);

        svc.grants.revoke_by_id(&ctx, grant.id).await.unwrap();
        let err = svc
            .resources
            .get(&RequestContext::user(user), folder.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAccess);
    }
}
