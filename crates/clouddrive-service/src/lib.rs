//! # clouddrive-service
//!
//! Business logic for CloudDrive. Each service checks access through the
//! [`AccessService`] and then delegates the structural work to the stores.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references. [`Services::build`] wires the
//! full set from a [`Stores`](clouddrive_database::Stores) value.

pub mod access;
pub mod context;
pub mod resource;
pub mod services;
pub mod share;
pub mod trash;
pub mod tree;

pub use access::AccessService;
pub use context::RequestContext;
pub use resource::{NewFile, ResourceService, ResourceView};
pub use services::Services;
pub use share::{GrantService, LinkShareRegistry, NewLink, ResolvedLink};
pub use trash::{TrashItem, TrashListing, TrashService};
pub use tree::TreeService;
