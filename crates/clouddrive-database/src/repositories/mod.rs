//! PostgreSQL implementations of the store traits.

pub mod grant;
pub mod link;
pub mod resource;
mod tx;

use std::sync::Arc;

use sqlx::PgPool;

use crate::store::Stores;

pub use grant::GrantRepository;
pub use link::LinkShareRepository;
pub use resource::ResourceRepository;

impl Stores {
    /// Build the PostgreSQL-backed stores over one pool.
    pub fn postgres(pool: PgPool, max_transaction_retries: u32) -> Self {
        Self {
            resources: Arc::new(ResourceRepository::new(
                pool.clone(),
                max_transaction_retries,
            )),
            grants: Arc::new(GrantRepository::new(
                pool.clone(),
                max_transaction_retries,
            )),
            links: Arc::new(LinkShareRepository::new(pool)),
        }
    }
}
