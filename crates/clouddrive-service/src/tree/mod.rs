//! Resource tree structure: creation, moves, renames, and traversal.

pub mod service;
pub mod walk;

pub use service::TreeService;
