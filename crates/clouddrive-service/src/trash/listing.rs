//! Trash page view models.

use serde::Serialize;

use clouddrive_entity::resource::Resource;

/// A top-level trash entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashItem {
    /// The trashed resource, including `deletedAt` and `deletedDirectly`.
    #[serde(flatten)]
    pub resource: Resource,
    /// Whole days until the item is purged.
    pub days_remaining: i64,
    /// Slash-separated path of the folder it was deleted from.
    pub original_location: String,
}

/// One page of a user's trash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashListing {
    /// Items on this page, most recently deleted first.
    pub items: Vec<TrashItem>,
    /// Total top-level items.
    pub total: u64,
    /// Applied page size.
    pub limit: u64,
    /// Applied offset.
    pub offset: u64,
    /// Whether more items follow.
    pub has_more: bool,
    /// Combined size of every trashed file.
    pub total_size_bytes: i64,
    /// Configured retention window.
    pub retention_days: u32,
}

/// Render ancestors (parent first) as `/Root/Child`. Root-level items live
/// at `/`.
pub(crate) fn location_of(ancestors: &[Resource]) -> String {
    if ancestors.is_empty() {
        return "/".to_string();
    }
    ancestors
        .iter()
        .rev()
        .fold(String::new(), |mut path, folder| {
            path.push('/');
            path.push_str(&folder.name);
            path
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clouddrive_core::types::id::{ResourceId, UserId};
    use clouddrive_entity::resource::NewResource;

    #[test]
    fn test_location_root_first() {
        let owner = UserId::new();
        let top = NewResource::folder("Projects", owner, None)
            .into_resource(ResourceId::new(), Utc::now());
        let mid = NewResource::folder("2024", owner, Some(top.id))
            .into_resource(ResourceId::new(), Utc::now());
        assert_eq!(location_of(&[mid, top]), "/Projects/2024");
        assert_eq!(location_of(&[]), "/");
    }
}
