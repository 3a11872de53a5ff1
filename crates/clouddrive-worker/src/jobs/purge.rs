//! Trash purge sweep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use clouddrive_service::TrashService;

use crate::executor::{JobExecutionError, JobHandler};

/// Upper bound on batches per run so one sweep cannot monopolize the store.
const MAX_BATCHES_PER_RUN: u32 = 100;

/// Hard-deletes every top-level trash item older than the retention window.
#[derive(Debug)]
pub struct TrashPurgeJob {
    /// Trash service
    trash: Arc<TrashService>,
    /// Items purged per batch
    batch_size: u32,
}

impl TrashPurgeJob {
    /// Job type name used for registration.
    pub const JOB_TYPE: &'static str = "trash_purge";

    /// Create a new purge job
    pub fn new(trash: Arc<TrashService>, batch_size: u32) -> Self {
        Self {
            trash,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl JobHandler for TrashPurgeJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        tracing::info!(batch_size = self.batch_size, "Running trash purge");

        let mut removed = 0u64;
        let mut batches = 0u32;
        while batches < MAX_BATCHES_PER_RUN {
            let purged = self
                .trash
                .purge_expired(self.batch_size)
                .await
                .map_err(|e| {
                    if e.is_retryable() {
                        JobExecutionError::Transient(format!("Trash purge failed: {e}"))
                    } else {
                        JobExecutionError::Internal(e)
                    }
                })?;
            batches += 1;
            if purged == 0 {
                break;
            }
            removed += purged;
        }

        tracing::info!(removed, batches, "Trash purge finished");
        Ok(serde_json::json!({
            "task": Self::JOB_TYPE,
            "resources_removed": removed,
            "batches": batches,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use clouddrive_core::config::AppConfig;
    use clouddrive_core::traits::ManualClock;
    use clouddrive_core::types::id::UserId;
    use clouddrive_database::{MemoryStore, ResourceStore, Stores};
    use clouddrive_service::{RequestContext, Services};

    #[tokio::test]
    async fn test_sweep_purges_only_expired() {
        let mut config = AppConfig::default();
        config.auth.argon2_memory_kib = 1024;
        config.auth.argon2_iterations = 1;
        let clock = ManualClock::new(Utc::now());
        let stores = Stores::from_single(Arc::new(MemoryStore::new()));
        let services = Services::build(stores, &config, Arc::new(clock.clone())).unwrap();

        let ctx = RequestContext::user(UserId::new());
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let folder = services.resources.create_folder(&ctx, name, None).await.unwrap();
            services.trash.soft_delete(&ctx, folder.id).await.unwrap();
            ids.push(folder.id);
        }
        clock.advance(Duration::days(31));
        let fresh = services.resources.create_folder(&ctx, "d", None).await.unwrap();
        services.trash.soft_delete(&ctx, fresh.id).await.unwrap();

        let job = TrashPurgeJob::new(services.trash.clone(), 2);
        let out = job.execute().await.unwrap();
        assert_eq!(out["resources_removed"], 3);

        let summary = services.trash.summary(&ctx).await.unwrap();
        assert_eq!(summary.item_count, 1);
        for id in ids {
            assert!(services.stores.resources.find_by_id(id).await.unwrap().is_none());
        }
    }
}
