//! Structural operations on the resource tree.
//!
//! These do no access checks. Callers authorize first; the store validates
//! structure inside its atomic unit before mutating anything.

use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::info;

use clouddrive_core::error::AppError;
use clouddrive_core::result::AppResult;
use clouddrive_core::traits::Clock;
use clouddrive_core::types::id::ResourceId;
use clouddrive_database::guard;
use clouddrive_database::store::ResourceStore;
use clouddrive_entity::resource::{NewResource, Resource, ResourceChanges};

use super::walk;

/// Creates, moves, renames, and walks resources.
#[derive(Clone)]
pub struct TreeService {
    resources: Arc<dyn ResourceStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService").finish_non_exhaustive()
    }
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(resources: Arc<dyn ResourceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { resources, clock }
    }

    /// Create a resource. `InvalidParent` when the parent is missing, a
    /// file, or in the trash.
    pub async fn create(&self, mut data: NewResource) -> AppResult<Resource> {
        data.name = guard::normalize_name(&data.name)?;
        let resource = self.resources.insert(data, self.clock.now()).await?;
        info!(
            resource_id = %resource.id,
            kind = %resource.kind,
            parent_id = ?resource.parent_id,
            owner_id = %resource.owner_id,
            "Resource created"
        );
        Ok(resource)
    }

    /// Rename and/or re-parent a resource in one atomic step.
    pub async fn update(
        &self,
        resource_id: ResourceId,
        changes: &ResourceChanges,
    ) -> AppResult<Resource> {
        let updated = self
            .resources
            .update(resource_id, changes, self.clock.now())
            .await?;
        info!(
            resource_id = %resource_id,
            name = %updated.name,
            parent_id = ?updated.parent_id,
            moved = changes.parent_id.is_some(),
            "Resource updated"
        );
        Ok(updated)
    }

    /// Move under `new_parent_id`, or to the owner's root when `None`.
    pub async fn move_resource(
        &self,
        resource_id: ResourceId,
        new_parent_id: Option<ResourceId>,
    ) -> AppResult<Resource> {
        self.update(resource_id, &ResourceChanges::move_to(new_parent_id))
            .await
    }

    /// Rename a resource.
    pub async fn rename(&self, resource_id: ResourceId, name: &str) -> AppResult<Resource> {
        self.update(resource_id, &ResourceChanges::rename(name)).await
    }

    /// Ancestors, immediate parent first and root last.
    pub async fn ancestors(&self, resource_id: ResourceId) -> AppResult<Vec<Resource>> {
        if self.resources.find_by_id(resource_id).await?.is_none() {
            return Err(AppError::not_found("Resource not found"));
        }
        self.resources.find_ancestors(resource_id).await
    }

    /// Lazy breadth-first stream of every descendant, trashed ones included.
    pub fn descendants(&self, resource_id: ResourceId) -> BoxStream<'static, AppResult<Resource>> {
        walk::descendants(self.resources.clone(), resource_id)
    }

    /// Direct children of a folder, trashed ones included.
    pub async fn children(&self, resource_id: ResourceId) -> AppResult<Vec<Resource>> {
        self.resources.find_children(&[resource_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use clouddrive_core::error::ErrorKind;
    use clouddrive_core::traits::ManualClock;
    use clouddrive_core::types::id::UserId;
    use clouddrive_database::MemoryStore;
    use futures::TryStreamExt;

    fn service() -> (TreeService, Arc<MemoryStore>, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc::now());
        (
            TreeService::new(store.clone(), Arc::new(clock.clone())),
            store,
            clock,
        )
    }

    #[tokio::test]
    async fn test_create_rejects_file_parent() {
        let (tree, _, _) = service();
        let owner = UserId::new();
        let file = tree
            .create(NewResource::file("a.txt", owner, None, 3, None))
            .await
            .unwrap();
        let err = tree
            .create(NewResource::folder("x", owner, Some(file.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParent);

        let err = tree
            .create(NewResource::folder("x", owner, Some(ResourceId::new())))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParent);
    }

    #[tokio::test]
    async fn test_create_under_trashed_parent_rejected() {
        let (tree, store, clock) = service();
        let owner = UserId::new();
        let root = tree.create(NewResource::folder("r", owner, None)).await.unwrap();
        let child = tree
            .create(NewResource::folder("c", owner, Some(root.id)))
            .await
            .unwrap();
        store.mark_deleted(root.id, clock.now()).await.unwrap();

        let err = tree
            .create(NewResource::folder("x", owner, Some(child.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParent);
    }

    #[tokio::test]
    async fn test_move_into_descendant_is_cycle() {
        let (tree, _, _) = service();
        let owner = UserId::new();
        let a = tree.create(NewResource::folder("a", owner, None)).await.unwrap();
        let b = tree.create(NewResource::folder("b", owner, Some(a.id))).await.unwrap();
        let c = tree.create(NewResource::folder("c", owner, Some(b.id))).await.unwrap();

        for target in [a.id, c.id] {
            let err = tree
                .update(a.id, &ResourceChanges::move_to(Some(target)))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::CycleDetected);
        }
    }

    #[tokio::test]
    async fn test_move_and_rename_touch_modified_at() {
        let (tree, _, clock) = service();
        let owner = UserId::new();
        let a = tree.create(NewResource::folder("a", owner, None)).await.unwrap();
        let b = tree.create(NewResource::folder("b", owner, None)).await.unwrap();

        clock.advance(Duration::minutes(1));
        let moved = tree.move_resource(b.id, Some(a.id)).await.unwrap();
        assert_eq!(moved.parent_id, Some(a.id));
        assert_eq!(moved.modified_at, clock.now());

        clock.advance(Duration::minutes(1));
        let renamed = tree.rename(b.id, "  beta ").await.unwrap();
        assert_eq!(renamed.name, "beta");
        assert_eq!(renamed.modified_at, clock.now());

        let back = tree.move_resource(b.id, None).await.unwrap();
        assert!(back.is_root());
    }

    #[tokio::test]
    async fn test_move_missing_target_not_found() {
        let (tree, _, _) = service();
        let a = tree
            .create(NewResource::folder("a", UserId::new(), None))
            .await
            .unwrap();
        let err = tree
            .update(a.id, &ResourceChanges::move_to(Some(ResourceId::new())))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_validates() {
        let (tree, _, _) = service();
        let a = tree
            .create(NewResource::folder("a", UserId::new(), None))
            .await
            .unwrap();
        for bad in ["", "   ", "a/b", ".."] {
            let err = tree
                .update(a.id, &ResourceChanges::rename(bad))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_ancestors_and_descendants() {
        let (tree, _, _) = service();
        let owner = UserId::new();
        let a = tree.create(NewResource::folder("a", owner, None)).await.unwrap();
        let b = tree.create(NewResource::folder("b", owner, Some(a.id))).await.unwrap();
        let c = tree.create(NewResource::folder("c", owner, Some(b.id))).await.unwrap();
        let d = tree
            .create(NewResource::file("d", owner, Some(a.id), 1, None))
            .await
            .unwrap();

        let chain: Vec<ResourceId> = tree
            .ancestors(c.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(chain, vec![b.id, a.id]);
        // Restartable: a second walk sees the same chain.
        assert_eq!(tree.ancestors(c.id).await.unwrap().len(), 2);

        let below: Vec<Resource> = tree.descendants(a.id).try_collect().await.unwrap();
        assert_eq!(below.len(), 3);
        assert_eq!(below.last().map(|r| r.id), Some(c.id));
        assert!(below[..2].iter().any(|r| r.id == d.id));

        let err = tree.ancestors(ResourceId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
