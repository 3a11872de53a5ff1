//! Link share tokens and credential verification.

pub mod token;
pub mod verifier;

pub use token::TokenGenerator;
pub use verifier::LinkVerifier;
