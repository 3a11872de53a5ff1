//! Authorization resolution.
//!
//! A decision is computed from the target and its ancestor chain:
//!
//! 1. A trashed target (or one under a trashed ancestor) only admits
//!    trash actions, for the owner or for whoever holds enough access on the
//!    nearest active ancestor.
//! 2. The owner of the target holds `Owner`.
//! 3. Otherwise the closest node carrying an ownership match or a direct
//!    grant decides the role. Grants never accumulate.
//! 4. Without any user match, a valid link on the target or an ancestor
//!    yields `min(link role, required role)`.
//! 5. Everything else is `NoAccess`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{ResourceId, UserId};
use clouddrive_database::store::{GrantStore, ResourceStore};
use clouddrive_entity::permission::{Action, Decision, DenyReason, Role};
use clouddrive_entity::principal::{LinkCredentials, Principal};
use clouddrive_entity::resource::Resource;

use crate::link::LinkVerifier;

/// Resolves `(principal, resource, action)` to a [`Decision`].
///
/// Denials are values. Only store failures surface as errors.
#[derive(Clone)]
pub struct AuthorizationResolver {
    resources: Arc<dyn ResourceStore>,
    grants: Arc<dyn GrantStore>,
    links: Arc<LinkVerifier>,
}

impl std::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResolver").finish_non_exhaustive()
    }
}

impl AuthorizationResolver {
    /// Creates a resolver over the given stores.
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        grants: Arc<dyn GrantStore>,
        links: Arc<LinkVerifier>,
    ) -> Self {
        Self {
            resources,
            grants,
            links,
        }
    }

    /// Decide whether `principal` may perform `action` on `resource_id`.
    pub async fn resolve(
        &self,
        principal: &Principal,
        resource_id: ResourceId,
        action: Action,
    ) -> AppResult<Decision> {
        let Some(target) = self.resources.find_by_id(resource_id).await? else {
            debug!(resource_id = %resource_id, %action, "Resource not found");
            return Ok(Decision::Denied(DenyReason::NoAccess));
        };

        let mut chain = Vec::with_capacity(8);
        chain.push(target);
        chain.extend(self.resources.find_ancestors(resource_id).await?);

        let roles = match principal.user_id {
            Some(user) => self.grant_roles(user, &chain).await?,
            None => HashMap::new(),
        };

        let decision = if chain.iter().any(Resource::is_deleted) {
            self.resolve_trashed(principal, &chain, &roles, action).await?
        } else {
            self.resolve_active(principal, &chain, &roles, action).await?
        };

        if let Decision::Denied(reason) = decision {
            debug!(
                resource_id = %resource_id,
                user_id = ?principal.user_id,
                %action,
                ?reason,
                "Access denied"
            );
        }
        Ok(decision)
    }

    async fn resolve_active(
        &self,
        principal: &Principal,
        chain: &[Resource],
        roles: &HashMap<ResourceId, Role>,
        action: Action,
    ) -> AppResult<Decision> {
        let required = action.required_role();

        if let Some(user) = principal.user_id {
            if let Some(role) = closest_role(user, chain, roles) {
                return Ok(if role.has_at_least(required) {
                    Decision::Allowed(role)
                } else {
                    Decision::Denied(DenyReason::NoAccess)
                });
            }
        }

        let Some(credentials) = &principal.link else {
            return Ok(Decision::Denied(DenyReason::NoAccess));
        };
        let link_role = match self.link_role(credentials, chain).await? {
            Ok(Some(role)) => role,
            Ok(None) => return Ok(Decision::Denied(DenyReason::NoAccess)),
            Err(reason) => return Ok(Decision::Denied(reason)),
        };
        Ok(if link_role.has_at_least(required) {
            Decision::Allowed(link_role.min(required))
        } else {
            Decision::Denied(DenyReason::NoAccess)
        })
    }

    async fn resolve_trashed(
        &self,
        principal: &Principal,
        chain: &[Resource],
        roles: &HashMap<ResourceId, Role>,
        action: Action,
    ) -> AppResult<Decision> {
        if let Some(user) = principal.user_id {
            if action.applies_to_trash() {
                if let Some(role) = trash_role(user, chain, roles) {
                    if role.has_at_least(trash_requirement(action)) {
                        return Ok(Decision::Allowed(role));
                    }
                }
            }
            if closest_role(user, chain, roles).is_some() {
                return Ok(Decision::Denied(DenyReason::ResourceDeleted));
            }
        }

        // Link holders learn that the item is trashed only through a valid link.
        if let Some(credentials) = &principal.link {
            return Ok(match self.link_role(credentials, chain).await? {
                Ok(Some(_)) => Decision::Denied(DenyReason::ResourceDeleted),
                Ok(None) => Decision::Denied(DenyReason::NoAccess),
                Err(reason) => Decision::Denied(reason),
            });
        }
        Ok(Decision::Denied(DenyReason::NoAccess))
    }

    async fn grant_roles(
        &self,
        user: UserId,
        chain: &[Resource],
    ) -> AppResult<HashMap<ResourceId, Role>> {
        let ids: Vec<ResourceId> = chain.iter().map(|r| r.id).collect();
        let grants = self.grants.find_for_grantee(user, &ids).await?;
        Ok(grants.into_iter().map(|g| (g.resource_id, g.role)).collect())
    }

    /// `Ok(Some(role))` when the link is usable and covers the chain,
    /// `Ok(None)` when it is usable but points elsewhere.
    async fn link_role(
        &self,
        credentials: &LinkCredentials,
        chain: &[Resource],
    ) -> AppResult<Result<Option<Role>, DenyReason>> {
        let link = match self
            .links
            .verify(&credentials.token, credentials.password.as_deref())
            .await?
        {
            Ok(link) => link,
            Err(reason) => return Ok(Err(reason)),
        };
        let covers = chain.iter().any(|r| r.id == link.resource_id);
        Ok(Ok(covers.then_some(link.role)))
    }
}

/// Role from the closest node with an ownership match or a direct grant.
fn closest_role(
    user: UserId,
    chain: &[Resource],
    roles: &HashMap<ResourceId, Role>,
) -> Option<Role> {
    chain.iter().find_map(|node| {
        if node.is_owned_by(user) {
            Some(Role::Owner)
        } else {
            roles.get(&node.id).copied()
        }
    })
}

/// The role that counts for trash actions: ownership of the target, else the
/// effective role on the nearest active ancestor.
fn trash_role(
    user: UserId,
    chain: &[Resource],
    roles: &HashMap<ResourceId, Role>,
) -> Option<Role> {
    let target = chain.first()?;
    if target.is_owned_by(user) {
        return Some(Role::Owner);
    }
    let nearest_active = chain.iter().skip(1).position(|r| !r.is_deleted())? + 1;
    closest_role(user, &chain[nearest_active..], roles)
}

/// Restoring only needs edit rights on the surrounding folder; purging
/// something early stays with owners.
fn trash_requirement(action: Action) -> Role {
    match action {
        Action::Restore => Role::Editor,
        other => other.required_role(),
    }
}
