//! Resource tree entities.

pub mod model;
pub mod trash;

pub use model::{NewResource, Resource, ResourceChanges, ResourceKind};
pub use trash::{TrashState, TrashSummary, days_remaining};
