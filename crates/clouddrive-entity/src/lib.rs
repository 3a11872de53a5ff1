//! # clouddrive-entity
//!
//! Domain entity models for CloudDrive. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod permission;
pub mod principal;
pub mod resource;
pub mod share;
