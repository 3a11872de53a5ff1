//! Link password hashing.

pub mod hasher;

use clouddrive_core::result::AppResult;

pub use hasher::PasswordHasher;

/// Checks a plaintext password against a stored hash.
pub trait PasswordCheck: Send + Sync {
    /// `Ok(true)` when `password` matches `hash`.
    fn check(&self, password: &str, hash: &str) -> AppResult<bool>;
}

impl PasswordCheck for PasswordHasher {
    fn check(&self, password: &str, hash: &str) -> AppResult<bool> {
        self.verify_password(password, hash)
    }
}
