//! Wiring for the full service set.

use std::sync::Arc;

use clouddrive_auth::{AuthorizationResolver, LinkVerifier, PasswordHasher, TokenGenerator};
use clouddrive_core::config::AppConfig;
use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_database::Stores;

use crate::access::AccessService;
use crate::resource::ResourceService;
use crate::share::{GrantService, LinkShareRegistry};
use crate::trash::TrashService;
use crate::tree::TreeService;

/// Every service, sharing one set of stores and one clock.
#[derive(Debug, Clone)]
pub struct Services {
    /// The backing stores.
    pub stores: Stores,
    /// Access checks.
    pub access: Arc<AccessService>,
    /// Structural tree operations.
    pub tree: Arc<TreeService>,
    /// Authorized browsing and editing.
    pub resources: Arc<ResourceService>,
    /// Direct grants.
    pub grants: Arc<GrantService>,
    /// Link shares.
    pub links: Arc<LinkShareRegistry>,
    /// Trash and retention.
    pub trash: Arc<TrashService>,
}

impl Services {
    /// Build the services over `stores`.
    pub fn build(stores: Stores, config: &AppConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let hasher = PasswordHasher::new(&config.auth)?;
        let verifier = Arc::new(LinkVerifier::new(
            stores.links.clone(),
            hasher.clone(),
            clock.clone(),
        )?);
        let resolver = Arc::new(AuthorizationResolver::new(
            stores.resources.clone(),
            stores.grants.clone(),
            verifier.clone(),
        ));
        let access = Arc::new(AccessService::new(resolver));

        let tree = Arc::new(TreeService::new(stores.resources.clone(), clock.clone()));
        let resources = Arc::new(ResourceService::new(
            stores.resources.clone(),
            tree.clone(),
            access.clone(),
        ));
        let grants = Arc::new(GrantService::new(
            stores.grants.clone(),
            access.clone(),
            clock.clone(),
        ));
        let links = Arc::new(LinkShareRegistry::new(
            stores.links.clone(),
            stores.resources.clone(),
            access.clone(),
            verifier,
            TokenGenerator::new(config.share.token_bytes),
            hasher,
            clock.clone(),
            config.share.token_attempts,
        ));
        let trash = Arc::new(TrashService::new(
            stores.resources.clone(),
            access.clone(),
            clock,
            config.trash.retention(),
        ));

        Ok(Self {
            stores,
            access,
            tree,
            resources,
            grants,
            links,
            trash,
        })
    }

    /// Services over a fresh in-memory store, a manual clock, and cheap
    /// password hashing.
    #[cfg(test)]
    pub(crate) fn for_tests() -> (Self, clouddrive_core::traits::ManualClock) {
        use clouddrive_core::traits::ManualClock;
        use clouddrive_database::MemoryStore;

        let mut config = AppConfig::default();
        config.auth.argon2_memory_kib = 1024;
        config.auth.argon2_iterations = 1;
        let clock = ManualClock::new(chrono::Utc::now());
        let stores = Stores::from_single(Arc::new(MemoryStore::new()));
        let services = Self::build(stores, &config, Arc::new(clock.clone()))
            .expect("test services");
        (services, clock)
    }
}
