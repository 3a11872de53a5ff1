//! Arena of resources with a parent-to-children index.

use std::collections::{HashMap, HashSet, VecDeque};

use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::resource::Resource;

#[derive(Debug, Default)]
pub(super) struct Tree {
    nodes: HashMap<ResourceId, Resource>,
    children: HashMap<ResourceId, Vec<ResourceId>>,
}

impl Tree {
    pub(super) fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.nodes.get(&id)
    }

    pub(super) fn get_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.nodes.get_mut(&id)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.nodes.values()
    }

    pub(super) fn insert(&mut self, resource: Resource) {
        if let Some(parent) = resource.parent_id {
            self.children.entry(parent).or_default().push(resource.id);
        }
        self.nodes.insert(resource.id, resource);
    }

    pub(super) fn remove(&mut self, id: ResourceId) {
        if let Some(resource) = self.nodes.remove(&id) {
            if let Some(parent) = resource.parent_id {
                self.detach(parent, id);
            }
        }
        self.children.remove(&id);
    }

    pub(super) fn reparent(&mut self, id: ResourceId, new_parent: Option<ResourceId>) {
        let Some(resource) = self.nodes.get_mut(&id) else {
            return;
        };
        let old_parent = std::mem::replace(&mut resource.parent_id, new_parent);
        if let Some(old) = old_parent {
            self.detach(old, id);
        }
        if let Some(new) = new_parent {
            self.children.entry(new).or_default().push(id);
        }
    }

    fn detach(&mut self, parent: ResourceId, child: ResourceId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|c| *c != child);
        }
    }

    pub(super) fn children(&self, id: ResourceId) -> impl Iterator<Item = &Resource> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|c| self.nodes.get(c))
    }

    /// Parent first, root last. A repeated ID ends the walk.
    pub(super) fn ancestors(&self, id: ResourceId) -> Vec<Resource> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut next = self.nodes.get(&id).and_then(|r| r.parent_id);
        while let Some(pid) = next {
            if !seen.insert(pid) {
                break;
            }
            let Some(parent) = self.nodes.get(&pid) else {
                break;
            };
            out.push(parent.clone());
            next = parent.parent_id;
        }
        out
    }

    /// `id` followed by its descendants in breadth-first order.
    pub(super) fn subtree_ids(&self, id: ResourceId) -> Vec<ResourceId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            if let Some(kids) = self.children.get(&current) {
                queue.extend(kids.iter().copied());
            }
        }
        out
    }

    pub(super) fn has_deleted_descendant(&self, id: ResourceId) -> bool {
        self.subtree_ids(id)
            .into_iter()
            .skip(1)
            .any(|d| self.nodes.get(&d).is_some_and(Resource::is_deleted))
    }

    /// Trashed resources whose parent is absent or active.
    pub(super) fn trash_roots(&self) -> impl Iterator<Item = &Resource> {
        self.nodes.values().filter(|r| {
            r.is_deleted()
                && r.parent_id
                    .and_then(|p| self.nodes.get(&p))
                    .is_none_or(|p| !p.is_deleted())
        })
    }
}
