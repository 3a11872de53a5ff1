//! Link share credential verification.
//!
//! Every call performs exactly one Argon2 verification, against the link's
//! hash when it has one and against a fixed decoy hash otherwise. The check
//! runs even when no password was supplied, so response time does not show
//! whether a token exists or is password protected.

use std::sync::Arc;

use tracing::debug;

use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_database::store::LinkShareStore;
use clouddrive_entity::permission::DenyReason;
use clouddrive_entity::share::LinkShare;

use crate::password::{PasswordCheck, PasswordHasher};

const DECOY_PASSWORD: &str = "clouddrive-link-decoy";

/// Resolves presented link credentials to a usable [`LinkShare`].
#[derive(Clone)]
pub struct LinkVerifier {
    links: Arc<dyn LinkShareStore>,
    passwords: Arc<dyn PasswordCheck>,
    clock: Arc<dyn Clock>,
    decoy_hash: String,
}

impl std::fmt::Debug for LinkVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkVerifier").finish_non_exhaustive()
    }
}

impl LinkVerifier {
    /// Creates a verifier. Hashes the decoy once up front.
    pub fn new(
        links: Arc<dyn LinkShareStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let decoy_hash = hasher.hash_password(DECOY_PASSWORD)?;
        Ok(Self {
            links,
            passwords: Arc::new(hasher),
            clock,
            decoy_hash,
        })
    }

    /// Check a token and optional password.
    ///
    /// Failures are reported in the order: unknown token, revoked, expired,
    /// wrong password. Only store or hashing failures are errors.
    pub async fn verify(
        &self,
        token: &str,
        password: Option<&str>,
    ) -> AppResult<Result<LinkShare, DenyReason>> {
        let link = self.links.find_by_token(token).await?;
        let supplied = password.unwrap_or_default();

        let (hash, protected) = match link.as_ref().and_then(|l| l.password_hash.as_deref()) {
            Some(hash) => (hash, true),
            None => (self.decoy_hash.as_str(), false),
        };
        let matched = self.passwords.check(supplied, hash)?;
        let password_ok = !protected || (password.is_some() && matched);

        let Some(link) = link else {
            debug!("Link token not found");
            return Ok(Err(DenyReason::InvalidToken));
        };
        if let Some(reason) = link.unusable_reason(self.clock.now()) {
            debug!(link_id = %link.id, ?reason, "Link not usable");
            return Ok(Err(reason));
        }
        if !password_ok {
            debug!(link_id = %link.id, "Link password mismatch");
            return Ok(Err(DenyReason::WrongPassword));
        }
        Ok(Ok(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, Utc};
    use clouddrive_core::config::auth::AuthConfig;
    use clouddrive_core::traits::ManualClock;
    use clouddrive_core::types::id::{ResourceId, UserId};
    use clouddrive_database::MemoryStore;
    use clouddrive_entity::permission::Role;
    use clouddrive_entity::share::NewLinkShare;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&AuthConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            ..AuthConfig::default()
        })
        .unwrap()
    }

    async fn setup(
        password: Option<&str>,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> (LinkVerifier, Arc<MemoryStore>, LinkShare, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc::now());
        let hasher = hasher();
        let link = LinkShareStore::insert(
            store.as_ref(),
            NewLinkShare {
                token: "tok".to_string(),
                resource_id: ResourceId::new(),
                role: Role::Viewer,
                password_hash: password.map(|p| hasher.hash_password(p).unwrap()),
                expires_at,
                created_by: UserId::new(),
            },
            clock.now(),
        )
        .await
        .unwrap();
        let verifier =
            LinkVerifier::new(store.clone(), hasher, Arc::new(clock.clone())).unwrap();
        (verifier, store, link, clock)
    }

    #[tokio::test]
    async fn test_password_flow_then_revoke() {
        let (verifier, store, link, clock) = setup(Some("x1"), None).await;

        let denied = verifier.verify("tok", Some("wrong")).await.unwrap();
        assert_eq!(denied.unwrap_err(), DenyReason::WrongPassword);
        let missing = verifier.verify("tok", None).await.unwrap();
        assert_eq!(missing.unwrap_err(), DenyReason::WrongPassword);

        let ok = verifier.verify("tok", Some("x1")).await.unwrap().unwrap();
        assert_eq!(ok.role, Role::Viewer);

        store.revoke(link.id, clock.now()).await.unwrap();
        let revoked = verifier.verify("tok", Some("x1")).await.unwrap();
        assert_eq!(revoked.unwrap_err(), DenyReason::Revoked);
    }

    #[tokio::test]
    async fn test_expired_link_never_resolves() {
        let (verifier, _store, _link, clock) =
            setup(Some("x1"), Some(Utc::now() + Duration::hours(1))).await;
        clock.advance(Duration::hours(2));
        let result = verifier.verify("tok", Some("x1")).await.unwrap();
        assert_eq!(result.unwrap_err(), DenyReason::Expired);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (verifier, _store, _link, _clock) = setup(None, None).await;
        let result = verifier.verify("nope", Some("x1")).await.unwrap();
        assert_eq!(result.unwrap_err(), DenyReason::InvalidToken);
    }

    struct CountingCheck {
        inner: PasswordHasher,
        calls: AtomicUsize,
    }

    impl PasswordCheck for CountingCheck {
        fn check(&self, password: &str, hash: &str) -> AppResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.check(password, hash)
        }
    }

    #[tokio::test]
    async fn test_one_hash_check_on_every_path() {
        let (verifier, store, _link, clock) =
            setup(Some("x1"), Some(Utc::now() + Duration::hours(1))).await;
        let counter = Arc::new(CountingCheck {
            inner: hasher(),
            calls: AtomicUsize::new(0),
        });
        let verifier = LinkVerifier {
            passwords: counter.clone(),
            ..verifier
        };
        let open = LinkShareStore::insert(
            store.as_ref(),
            NewLinkShare {
                token: "open".to_string(),
                resource_id: ResourceId::new(),
                role: Role::Viewer,
                password_hash: None,
                expires_at: None,
                created_by: UserId::new(),
            },
            clock.now(),
        )
        .await
        .unwrap();

        let cases: [(&str, Option<&str>, Option<DenyReason>); 6] = [
            ("nope", None, Some(DenyReason::InvalidToken)),
            ("nope", Some("x1"), Some(DenyReason::InvalidToken)),
            ("tok", None, Some(DenyReason::WrongPassword)),
            ("tok", Some("wrong"), Some(DenyReason::WrongPassword)),
            ("tok", Some("x1"), None),
            ("open", None, None),
        ];
        for (token, password, expected) in cases {
            let before = counter.calls.load(Ordering::SeqCst);
            let result = verifier.verify(token, password).await.unwrap();
            assert_eq!(result.err(), expected, "{token} {password:?}");
            assert_eq!(counter.calls.load(Ordering::SeqCst), before + 1);
        }

        store.revoke(open.id, clock.now()).await.unwrap();
        clock.advance(Duration::hours(2));
        for (token, expected) in [("open", DenyReason::Revoked), ("tok", DenyReason::Expired)] {
            let before = counter.calls.load(Ordering::SeqCst);
            let result = verifier.verify(token, None).await.unwrap();
            assert_eq!(result.err(), Some(expected));
            assert_eq!(counter.calls.load(Ordering::SeqCst), before + 1);
        }
    }

    #[tokio::test]
    async fn test_open_link_ignores_password() {
        let (verifier, _store, _link, _clock) = setup(None, None).await;
        assert!(verifier.verify("tok", None).await.unwrap().is_ok());
        assert!(verifier.verify("tok", Some("anything")).await.unwrap().is_ok());
    }
}
