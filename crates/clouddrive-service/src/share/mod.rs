//! Direct grants and public link shares.

pub mod grant;
pub mod link;

pub use grant::GrantService;
pub use link::{LinkShareRegistry, NewLink, ResolvedLink};
