//! Roles, actions, and authorization decisions.

pub mod action;
pub mod decision;
pub mod role;

pub use action::Action;
pub use decision::{Decision, DenyReason};
pub use role::Role;
