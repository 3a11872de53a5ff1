//! Soft delete, restore, and retention-bound purge.

pub mod listing;
pub mod service;

pub use listing::{TrashItem, TrashListing};
pub use service::TrashService;
