//! Access control: one decision from ownership, inherited grants, and links.

pub mod resolver;

pub use resolver::AuthorizationResolver;
