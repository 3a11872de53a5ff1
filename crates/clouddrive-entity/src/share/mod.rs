//! Direct grants and public link shares.

pub mod grant;
pub mod link;

pub use grant::Grant;
pub use link::{LinkShare, NewLinkShare};
