//! # clouddrive-auth
//!
//! Access decisions for CloudDrive.
//!
//! ## Modules
//!
//! - `acl` composes ownership, inherited grants, and link access into one decision
//! - `link` generates link tokens and verifies presented link credentials
//! - `password` hashes and verifies link passwords with Argon2id
//! - `jwt` validates bearer tokens issued by the identity provider

pub mod acl;
pub mod jwt;
pub mod link;
pub mod password;

pub use acl::AuthorizationResolver;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use link::{LinkVerifier, TokenGenerator};
pub use password::{PasswordCheck, PasswordHasher};
