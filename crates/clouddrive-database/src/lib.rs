//! # clouddrive-database
//!
//! Persistence for CloudDrive. The [`store`] module defines the repository
//! traits the services depend on; [`repositories`] implements them on
//! PostgreSQL and [`memory`] implements them in process.

pub mod connection;
pub mod guard;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use store::{GrantStore, LinkShareStore, ResourceStore, Stores};
