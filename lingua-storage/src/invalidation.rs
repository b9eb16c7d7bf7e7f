//! Tree invalidation trigger.
//!
//! Cached resolutions for a page are tagged with [`children_tag`] of that
//! page. Any edit below a page (its translation folder, a translation node,
//! a locale field) changes the children of some ancestor of the edited node,
//! so a change invalidates the children tag of the node itself and of every
//! ancestor on its path.

use lingua_core::{LinguaResult, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheBackend, ViewMode};

/// Tag carried by every entry whose value depends on the children of `node_id`.
pub fn children_tag(node_id: NodeId) -> String {
    format!("children:{}", node_id)
}

/// A mutation of the content tree, as reported by the tree owner.
///
/// Ancestor paths are root first and exclude the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeChange {
    /// Children were added, removed or reordered under `node`.
    ChildrenChanged { node: NodeId, ancestors: Vec<NodeId> },
    /// Fields or type of `node` were edited.
    Saved { node: NodeId, ancestors: Vec<NodeId> },
    Published { node: NodeId, ancestors: Vec<NodeId> },
    Unpublished { node: NodeId, ancestors: Vec<NodeId> },
    Deleted { node: NodeId, ancestors: Vec<NodeId> },
    /// `node` moved from under one path to another.
    Moved {
        node: NodeId,
        from: Vec<NodeId>,
        to: Vec<NodeId>,
    },
}

impl TreeChange {
    /// The node the change happened to.
    pub fn node(&self) -> NodeId {
        match self {
            TreeChange::ChildrenChanged { node, .. }
            | TreeChange::Saved { node, .. }
            | TreeChange::Published { node, .. }
            | TreeChange::Unpublished { node, .. }
            | TreeChange::Deleted { node, .. }
            | TreeChange::Moved { node, .. } => *node,
        }
    }

    /// Every node whose children tag the change invalidates: the node
    /// itself, then its ancestors (both paths for a move), without repeats.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        let node = self.node();
        let paths: Vec<&NodeId> = match self {
            TreeChange::ChildrenChanged { ancestors, .. }
            | TreeChange::Saved { ancestors, .. }
            | TreeChange::Published { ancestors, .. }
            | TreeChange::Unpublished { ancestors, .. }
            | TreeChange::Deleted { ancestors, .. } => ancestors.iter().rev().collect(),
            TreeChange::Moved { from, to, .. } => {
                from.iter().rev().chain(to.iter().rev()).collect()
            }
        };

        let mut seen = HashSet::new();
        std::iter::once(node)
            .chain(paths.into_iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TreeChange::ChildrenChanged { .. } => "children_changed",
            TreeChange::Saved { .. } => "saved",
            TreeChange::Published { .. } => "published",
            TreeChange::Unpublished { .. } => "unpublished",
            TreeChange::Deleted { .. } => "deleted",
            TreeChange::Moved { .. } => "moved",
        }
    }
}

impl fmt::Display for TreeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.node())
    }
}

/// Turns tree changes into tag invalidations on a cache backend.
pub struct TreeInvalidator<B: CacheBackend> {
    backend: Arc<B>,
}

impl<B: CacheBackend> Clone for TreeInvalidator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: CacheBackend> TreeInvalidator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Invalidate everything a tree change can affect.
    ///
    /// Returns the number of cache entries evicted.
    pub async fn apply(&self, change: &TreeChange) -> LinguaResult<u64> {
        let mut evicted = 0;
        for node in change.affected_nodes() {
            evicted += self.backend.invalidate_tag(&children_tag(node)).await?;
        }
        tracing::debug!(change = %change, evicted, "Applied tree change to cache");
        Ok(evicted)
    }

    /// Invalidate entries depending on the children of one node.
    pub async fn invalidate_node(&self, node_id: NodeId) -> LinguaResult<u64> {
        let evicted = self.backend.invalidate_tag(&children_tag(node_id)).await?;
        tracing::debug!(node_id = %node_id, evicted, "Invalidated node children");
        Ok(evicted)
    }

    /// Invalidate every entry computed under a content view.
    pub async fn invalidate_view(&self, mode: ViewMode) -> LinguaResult<u64> {
        let evicted = self.backend.invalidate_tag(mode.tag()).await?;
        tracing::debug!(view = %mode, evicted, "Invalidated view scope");
        Ok(evicted)
    }

    /// Invalidate an arbitrary tag, such as a custom scope tag.
    pub async fn invalidate_tag(&self, tag: &str) -> LinguaResult<u64> {
        self.backend.invalidate_tag(tag).await
    }
}
