//! Authorized folder and file operations.

pub mod service;

pub use service::{NewFile, ResourceService, ResourceView};
