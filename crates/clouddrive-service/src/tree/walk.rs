//! Lazy breadth-first traversal below a resource.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use clouddrive_core::result::AppResult;
use clouddrive_core::types::id::ResourceId;
use clouddrive_database::store::ResourceStore;
use clouddrive_entity::resource::Resource;

struct Walk {
    store: Arc<dyn ResourceStore>,
    buffer: VecDeque<Resource>,
    frontier: Vec<ResourceId>,
    seen: HashSet<ResourceId>,
    failed: bool,
}

impl Walk {
    async fn next(mut self) -> Option<(AppResult<Resource>, Self)> {
        loop {
            if let Some(resource) = self.buffer.pop_front() {
                return Some((Ok(resource), self));
            }
            if self.failed || self.frontier.is_empty() {
                return None;
            }
            let level = std::mem::take(&mut self.frontier);
            match self.store.find_children(&level).await {
                Ok(children) => {
                    for child in children {
                        if self.seen.insert(child.id) {
                            self.frontier.push(child.id);
                            self.buffer.push_back(child);
                        }
                    }
                }
                Err(err) => {
                    self.failed = true;
                    return Some((Err(err), self));
                }
            }
        }
    }
}

/// Stream every descendant of `root`, one store query per tree level.
///
/// Nothing is fetched until the stream is polled, and dropping it stops the
/// walk. A store failure is yielded once and ends the stream.
pub fn descendants(
    store: Arc<dyn ResourceStore>,
    root: ResourceId,
) -> BoxStream<'static, AppResult<Resource>> {
    let walk = Walk {
        store,
        buffer: VecDeque::new(),
        frontier: vec![root],
        seen: HashSet::from([root]),
        failed: false,
    };
    stream::unfold(walk, Walk::next).boxed()
}
