//! In-process store.
//!
//! Holds every row behind one async `RwLock`, so each mutating call is
//! atomic with respect to every other. Used for development and by the test
//! suites.

mod tree;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::{GrantId, LinkShareId, ResourceId, UserId};
use clouddrive_core::types::pagination::{PageRequest, PageResponse};
use clouddrive_entity::permission::Role;
use clouddrive_entity::resource::{NewResource, Resource, ResourceChanges, TrashSummary};
use clouddrive_entity::share::{Grant, LinkShare, NewLinkShare};

use crate::guard::{self, RestoreStep};
use crate::store::{GrantStore, LinkShareStore, ResourceStore};

use self::tree::Tree;

#[derive(Debug, Default)]
struct Inner {
    tree: Tree,
    grants: HashMap<GrantId, Grant>,
    grant_index: HashMap<(ResourceId, UserId), GrantId>,
    links: HashMap<LinkShareId, LinkShare>,
    tokens: HashMap<String, LinkShareId>,
}

impl Inner {
    fn remove_rows_for(&mut self, ids: &HashSet<ResourceId>) {
        let grant_ids: Vec<GrantId> = self
            .grants
            .values()
            .filter(|g| ids.contains(&g.resource_id))
            .map(|g| g.id)
            .collect();
        for id in grant_ids {
            if let Some(g) = self.grants.remove(&id) {
                self.grant_index.remove(&(g.resource_id, g.grantee_user_id));
            }
        }

        let link_ids: Vec<LinkShareId> = self
            .links
            .values()
            .filter(|l| ids.contains(&l.resource_id))
            .map(|l| l.id)
            .collect();
        for id in link_ids {
            if let Some(l) = self.links.remove(&id) {
                self.tokens.remove(&l.token);
            }
        }
    }
}

/// Store keeping all rows in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find_by_id(&self, id: ResourceId) -> AppResult<Option<Resource>> {
        Ok(self.inner.read().await.tree.get(id).cloned())
    }

    async fn find_ancestors(&self, id: ResourceId) -> AppResult<Vec<Resource>> {
        Ok(self.inner.read().await.tree.ancestors(id))
    }

    async fn find_children(&self, parent_ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        let inner = self.inner.read().await;
        let mut out = Vec::new();
        for parent in parent_ids {
            out.extend(inner.tree.children(*parent).cloned());
        }
        Ok(out)
    }

    async fn find_roots(&self, owner_id: UserId) -> AppResult<Vec<Resource>> {
        let inner = self.inner.read().await;
        let mut roots: Vec<Resource> = inner
            .tree
            .iter()
            .filter(|r| r.is_root() && r.is_owned_by(owner_id) && !r.is_deleted())
            .cloned()
            .collect();
        roots.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        Ok(roots)
    }

    async fn insert(&self, data: NewResource, now: DateTime<Utc>) -> AppResult<Resource> {
        let mut inner = self.inner.write().await;
        if let Some(parent_id) = data.parent_id {
            let chain = inner.tree.ancestors(parent_id);
            guard::check_create_parent(parent_id, inner.tree.get(parent_id), &chain)?;
        }
        let resource = data.into_resource(ResourceId::new(), now);
        inner.tree.insert(resource.clone());
        Ok(resource)
    }

    async fn update(
        &self,
        id: ResourceId,
        changes: &ResourceChanges,
        now: DateTime<Utc>,
    ) -> AppResult<Resource> {
        let name = changes.name.as_deref().map(guard::normalize_name).transpose()?;
        let mut inner = self.inner.write().await;
        let chain = inner.tree.ancestors(id);
        let resource = guard::require_active(inner.tree.get(id).cloned(), &chain)?;

        if let Some(new_parent_id) = changes.parent_id {
            let target = match new_parent_id {
                Some(pid) => {
                    let parent = inner
                        .tree
                        .get(pid)
                        .cloned()
                        .ok_or_else(|| AppError::not_found("Destination folder not found"))?;
                    Some((parent, inner.tree.ancestors(pid)))
                }
                None => None,
            };
            let trashed_below = inner.tree.has_deleted_descendant(id);
            guard::check_move(
                &resource,
                target.as_ref().map(|(p, a)| (p, a.as_slice())),
                trashed_below,
            )?;
            inner.tree.reparent(id, new_parent_id);
        }

        let updated = inner
            .tree
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        if let Some(name) = name {
            updated.name = name;
        }
        updated.modified_at = now;
        Ok(updated.clone())
    }

    async fn mark_deleted(&self, id: ResourceId, now: DateTime<Utc>) -> AppResult<Vec<ResourceId>> {
        let mut inner = self.inner.write().await;
        let chain = inner.tree.ancestors(id);
        let target = inner
            .tree
            .get(id)
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        if guard::is_effectively_deleted(target, &chain) {
            return Err(AppError::new(
                ErrorKind::ResourceDeleted,
                "Resource is already in the trash",
            ));
        }

        let mut marked = Vec::new();
        for current in inner.tree.subtree_ids(id) {
            if let Some(r) = inner.tree.get_mut(current) {
                if r.deleted_at.is_none() {
                    r.deleted_at = Some(now);
                    r.deleted_directly = current == id;
                    marked.push(current);
                }
            }
        }
        debug!(resource_id = %id, count = marked.len(), "Marked subtree deleted");
        Ok(marked)
    }

    async fn clear_deleted(
        &self,
        id: ResourceId,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Resource> {
        let mut inner = self.inner.write().await;
        let chain = inner.tree.ancestors(id);
        let resource = inner
            .tree
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Resource not found"))?;
        if guard::check_restore(resource, &chain, retention, now)? == RestoreStep::Clear {
            resource.deleted_at = None;
            resource.deleted_directly = false;
        }
        Ok(resource.clone())
    }

    async fn purge_subtree(
        &self,
        id: ResourceId,
        deleted_before: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<ResourceId>> {
        let mut inner = self.inner.write().await;
        let Some(root) = inner.tree.get(id) else {
            return Ok(Vec::new());
        };
        guard::check_purge(root, deleted_before)?;

        let ids = inner.tree.subtree_ids(id);
        let set: HashSet<ResourceId> = ids.iter().copied().collect();
        inner.remove_rows_for(&set);
        // Children first so the tree index never points at a missing parent.
        for rid in ids.iter().rev() {
            inner.tree.remove(*rid);
        }
        Ok(ids)
    }

    async fn find_trashed(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Resource>> {
        let inner = self.inner.read().await;
        let mut items: Vec<Resource> = inner
            .tree
            .trash_roots()
            .filter(|r| r.is_owned_by(owner_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(a.name.cmp(&b.name)));
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn trash_summary(&self, owner_id: UserId) -> AppResult<TrashSummary> {
        let inner = self.inner.read().await;
        let item_count = inner
            .tree
            .trash_roots()
            .filter(|r| r.is_owned_by(owner_id))
            .count() as u64;
        let total_size_bytes = inner
            .tree
            .iter()
            .filter(|r| r.is_owned_by(owner_id) && r.is_deleted())
            .filter_map(|r| r.size_bytes)
            .sum();
        Ok(TrashSummary {
            item_count,
            total_size_bytes,
        })
    }

    async fn find_purgeable(
        &self,
        deleted_before: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<ResourceId>> {
        let inner = self.inner.read().await;
        let mut due: Vec<&Resource> = inner
            .tree
            .trash_roots()
            .filter(|r| r.deleted_at.is_some_and(|at| at <= deleted_before))
            .collect();
        due.sort_by_key(|r| r.deleted_at);
        Ok(due.into_iter().take(limit as usize).map(|r| r.id).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>> {
        Ok(self.inner.read().await.grants.get(&id).cloned())
    }

    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<Grant>> {
        let inner = self.inner.read().await;
        let mut grants: Vec<Grant> = inner
            .grants
            .values()
            .filter(|g| g.resource_id == resource_id)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.created_at);
        Ok(grants)
    }

    async fn find_for_grantee(
        &self,
        grantee: UserId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<Grant>> {
        let inner = self.inner.read().await;
        Ok(resource_ids
            .iter()
            .filter_map(|rid| inner.grant_index.get(&(*rid, grantee)))
            .filter_map(|gid| inner.grants.get(gid))
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
        granted_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Grant> {
        let mut inner = self.inner.write().await;
        guard::check_grantee(inner.tree.get(resource_id), grantee)?;
        if let Some(gid) = inner.grant_index.get(&(resource_id, grantee)).copied() {
            if let Some(existing) = inner.grants.get_mut(&gid) {
                existing.role = role;
                existing.granted_by = granted_by;
                return Ok(existing.clone());
            }
        }
        let grant = Grant {
            id: GrantId::new(),
            resource_id,
            grantee_user_id: grantee,
            role,
            granted_by,
            created_at: now,
        };
        inner.grant_index.insert((resource_id, grantee), grant.id);
        inner.grants.insert(grant.id, grant.clone());
        Ok(grant)
    }

    async fn update_role(
        &self,
        resource_id: ResourceId,
        grantee: UserId,
        role: Role,
    ) -> AppResult<Option<Grant>> {
        let mut inner = self.inner.write().await;
        let Some(gid) = inner.grant_index.get(&(resource_id, grantee)).copied() else {
            return Ok(None);
        };
        Ok(inner.grants.get_mut(&gid).map(|g| {
            g.role = role;
            g.clone()
        }))
    }

    async fn delete(&self, resource_id: ResourceId, grantee: UserId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.grant_index.remove(&(resource_id, grantee)) {
            Some(gid) => Ok(inner.grants.remove(&gid).is_some()),
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LinkShareStore for MemoryStore {
    async fn find_by_id(&self, id: LinkShareId) -> AppResult<Option<LinkShare>> {
        Ok(self.inner.read().await.links.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<LinkShare>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .get(token)
            .and_then(|id| inner.links.get(id))
            .cloned())
    }

    async fn find_for_resource(&self, resource_id: ResourceId) -> AppResult<Vec<LinkShare>> {
        let inner = self.inner.read().await;
        let mut links: Vec<LinkShare> = inner
            .links
            .values()
            .filter(|l| l.resource_id == resource_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn insert(&self, data: NewLinkShare, now: DateTime<Utc>) -> AppResult<LinkShare> {
        let mut inner = self.inner.write().await;
        if inner.tokens.contains_key(&data.token) {
            return Err(AppError::conflict("Link token already in use"));
        }
        let link = data.into_link(LinkShareId::new(), now);
        inner.tokens.insert(link.token.clone(), link.id);
        inner.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn revoke(&self, id: LinkShareId, now: DateTime<Utc>) -> AppResult<Option<LinkShare>> {
        let mut inner = self.inner.write().await;
        Ok(inner.links.get_mut(&id).map(|link| {
            link.revoked_at.get_or_insert(now);
            link.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn folder(store: &MemoryStore, owner: UserId, parent: Option<ResourceId>) -> Resource {
        ResourceStore::insert(store, NewResource::folder("folder", owner, parent), Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ancestors_parent_first() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let a = folder(&store, owner, None).await;
        let b = folder(&store, owner, Some(a.id)).await;
        let c = folder(&store, owner, Some(b.id)).await;

        let chain: Vec<ResourceId> = store
            .find_ancestors(c.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(chain, vec![b.id, a.id]);
        assert!(store.find_ancestors(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cascade_keeps_earlier_deletes() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let root = folder(&store, owner, None).await;
        let child = folder(&store, owner, Some(root.id)).await;
        let t0 = Utc::now();

        store.mark_deleted(child.id, t0).await.unwrap();
        let t1 = t0 + Duration::hours(1);
        let marked = store.mark_deleted(root.id, t1).await.unwrap();
        assert_eq!(marked, vec![root.id]);

        let child = ResourceStore::find_by_id(&store, child.id).await.unwrap().unwrap();
        assert_eq!(child.deleted_at, Some(t0));
        assert!(child.deleted_directly);
        let root = ResourceStore::find_by_id(&store, root.id).await.unwrap().unwrap();
        assert!(root.deleted_directly);
    }

    #[tokio::test]
    async fn test_purge_removes_grants_and_links() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let other = UserId::new();
        let root = folder(&store, owner, None).await;
        let child = folder(&store, owner, Some(root.id)).await;
        let now = Utc::now();
        store.upsert(child.id, other, Role::Viewer, owner, now).await.unwrap();
        LinkShareStore::insert(
            &store,
            NewLinkShare {
                token: "t1".to_string(),
                resource_id: child.id,
                role: Role::Viewer,
                password_hash: None,
                expires_at: None,
                created_by: owner,
            },
            now,
        )
        .await
        .unwrap();

        store.mark_deleted(root.id, now).await.unwrap();
        let purged = store.purge_subtree(root.id, None).await.unwrap();
        assert_eq!(purged.len(), 2);
        assert!(
            GrantStore::find_for_resource(&store, child.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.find_by_token("t1").await.unwrap().is_none());

        // Second purge is a no-op.
        assert!(store.purge_subtree(root.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_move_keeps_name() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let a = folder(&store, owner, None).await;
        let b = folder(&store, owner, Some(a.id)).await;

        let changes = ResourceChanges {
            name: Some("Renamed".to_string()),
            parent_id: Some(Some(b.id)),
        };
        let err = store.update(a.id, &changes, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CycleDetected);

        let bad_name = ResourceChanges {
            name: Some("a/b".to_string()),
            parent_id: Some(None),
        };
        let err = store.update(b.id, &bad_name, Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let a = ResourceStore::find_by_id(&store, a.id).await.unwrap().unwrap();
        assert_eq!(a.name, "folder");
        let b = ResourceStore::find_by_id(&store, b.id).await.unwrap().unwrap();
        assert_eq!(b.parent_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_rename_and_move_together() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let a = folder(&store, owner, None).await;
        let b = folder(&store, owner, None).await;

        let changes = ResourceChanges {
            name: Some(" moved ".to_string()),
            parent_id: Some(Some(a.id)),
        };
        let updated = store.update(b.id, &changes, Utc::now()).await.unwrap();
        assert_eq!(updated.name, "moved");
        assert_eq!(updated.parent_id, Some(a.id));
        assert_eq!(
            store.find_children(&[a.id]).await.unwrap().first().map(|r| r.id),
            Some(b.id)
        );
    }

    #[tokio::test]
    async fn test_upsert_checks_resource() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let root = folder(&store, owner, None).await;
        let now = Utc::now();

        let err = store.upsert(root.id, owner, Role::Editor, owner, now).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SelfGrant);

        store.mark_deleted(root.id, now).await.unwrap();
        store.purge_subtree(root.id, None).await.unwrap();
        let err = store
            .upsert(root.id, UserId::new(), Role::Viewer, owner, now)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAccess);
    }

    #[tokio::test]
    async fn test_duplicate_token_conflicts() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let root = folder(&store, owner, None).await;
        let new_link = || NewLinkShare {
            token: "same".to_string(),
            resource_id: root.id,
            role: Role::Viewer,
            password_hash: None,
            expires_at: None,
            created_by: owner,
        };
        LinkShareStore::insert(&store, new_link(), Utc::now()).await.unwrap();
        let err = LinkShareStore::insert(&store, new_link(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }
}
