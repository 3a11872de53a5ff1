//! Trash lifecycle derived from `deleted_at`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle position of a resource relative to the retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashState {
    /// Not deleted.
    Active,
    /// Deleted and still restorable.
    Recoverable,
    /// Deleted for at least the retention period; eligible for purge.
    Expired,
}

impl TrashState {
    /// Classify a resource from its soft-delete marker.
    pub fn of(deleted_at: Option<DateTime<Utc>>, retention: Duration, now: DateTime<Utc>) -> Self {
        match deleted_at {
            None => Self::Active,
            Some(at) if now - at >= retention => Self::Expired,
            Some(_) => Self::Recoverable,
        }
    }

    /// Check if the resource may still be restored.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Aggregate view of a user's trash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashSummary {
    /// Number of top-level trashed items.
    pub item_count: u64,
    /// Combined size of every trashed file.
    pub total_size_bytes: i64,
}

/// Whole days left before a trashed resource becomes eligible for purge,
/// rounded up. Never negative.
pub fn days_remaining(deleted_at: DateTime<Utc>, retention: Duration, now: DateTime<Utc>) -> i64 {
    let left = (deleted_at + retention - now).num_milliseconds();
    if left <= 0 {
        return 0;
    }
    (left + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}
