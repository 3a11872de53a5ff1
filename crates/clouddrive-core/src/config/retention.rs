//! Trash retention and link share configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Soft-delete retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashConfig {
    /// Days a trashed resource stays restorable.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Cron expression (with seconds) for the purge sweep.
    #[serde(default = "default_purge_schedule")]
    pub purge_schedule: String,
    /// Maximum number of expired trash roots purged per sweep.
    #[serde(default = "default_purge_batch")]
    pub purge_batch_size: u32,
}

impl TrashConfig {
    /// The retention period as a duration.
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            purge_schedule: default_purge_schedule(),
            purge_batch_size: default_purge_batch(),
        }
    }
}

/// Link share settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Random bytes per generated token, before URL-safe encoding.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
    /// Attempts at generating a unique token before giving up.
    #[serde(default = "default_token_attempts")]
    pub token_attempts: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            token_bytes: default_token_bytes(),
            token_attempts: default_token_attempts(),
        }
    }
}

fn default_retention_days() -> u32 {
    30
}

fn default_purge_schedule() -> String {
    "0 0 * * * *".to_string()
}

fn default_purge_batch() -> u32 {
    100
}

fn default_token_bytes() -> usize {
    32
}

fn default_token_attempts() -> u32 {
    5
}
