//! Content store contract and in-memory tree.
//!
//! The resolver only ever reads the tree, and only by id. Tree mutation is
//! the owner's business; `InMemoryContentStore` exposes a small mutation API
//! so tests and embedders can drive edits and the matching invalidations.

use async_trait::async_trait;
use lingua_core::{ContentNode, LinguaResult, NodeId, StoreError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

/// Read access to the content tree.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch a node with its fields and children.
    ///
    /// Returns `Ok(None)` when no node has this id.
    async fn get_by_id(&self, id: NodeId) -> LinguaResult<Option<ContentNode>>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone)]
struct NodeRecord {
    type_alias: String,
    fields: BTreeMap<String, Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Tree {
    records: HashMap<NodeId, NodeRecord>,
    roots: Vec<NodeId>,
}

impl Tree {
    fn materialize(&self, id: NodeId) -> Option<ContentNode> {
        let record = self.records.get(&id)?;
        Some(ContentNode {
            id,
            type_alias: record.type_alias.clone(),
            fields: record.fields.clone(),
            children: record
                .children
                .iter()
                .filter_map(|child| self.materialize(*child))
                .collect(),
        })
    }

    fn insert_subtree(&mut self, parent: Option<NodeId>, node: ContentNode) {
        let id = node.id;
        let children: Vec<NodeId> = node.children.iter().map(|c| c.id).collect();
        for child in node.children {
            self.insert_subtree(Some(id), child);
        }
        self.records.insert(
            id,
            NodeRecord {
                type_alias: node.type_alias,
                fields: node.fields,
                parent,
                children,
            },
        );
    }

    fn collect_ids(node: &ContentNode, out: &mut Vec<NodeId>) {
        out.push(node.id);
        for child in &node.children {
            Self::collect_ids(child, out);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.records.get(&id).and_then(|r| r.parent);
        match parent {
            Some(parent) => {
                if let Some(record) = self.records.get_mut(&parent) {
                    record.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(record) = self.records.remove(&id) else {
            return 0;
        };
        1 + record
            .children
            .into_iter()
            .map(|child| self.remove_subtree(child))
            .sum::<usize>()
    }

    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.records.get(&id).and_then(|r| r.parent);
        while let Some(parent) = current {
            path.push(parent);
            current = self.records.get(&parent).and_then(|r| r.parent);
        }
        path.reverse();
        path
    }
}

/// In-memory content tree.
///
/// Children keep their insertion order, which is the order the resolver
/// scans them in.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    tree: RwLock<Tree>,
}

impl InMemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given root subtrees.
    pub fn with_roots(roots: impl IntoIterator<Item = ContentNode>) -> LinguaResult<Self> {
        let store = Self::new();
        for root in roots {
            store.insert(None, root)?;
        }
        Ok(store)
    }

    /// Insert a subtree, appended as the last child of `parent` (or as a root).
    pub fn insert(&self, parent: Option<NodeId>, node: ContentNode) -> LinguaResult<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;

        let mut ids = Vec::new();
        Tree::collect_ids(&node, &mut ids);
        if let Some(existing) = ids.iter().find(|id| tree.records.contains_key(*id)) {
            return Err(StoreError::InsertFailed {
                id: existing.get(),
                reason: "already exists".to_string(),
            }
            .into());
        }
        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(repeated) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(StoreError::InsertFailed {
                id: repeated.get(),
                reason: "appears more than once in the subtree".to_string(),
            }
            .into());
        }

        let id = node.id;
        match parent {
            Some(parent_id) => {
                let record = tree.records.get_mut(&parent_id).ok_or(StoreError::InsertFailed {
                    id: id.get(),
                    reason: format!("parent {} not found", parent_id),
                })?;
                record.children.push(id);
            }
            None => tree.roots.push(id),
        }
        tree.insert_subtree(parent, node);
        Ok(())
    }

    /// Set (or replace) a field value on an existing node.
    pub fn set_field(
        &self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> LinguaResult<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = tree.records.get_mut(&id).ok_or(StoreError::UpdateFailed {
            id: id.get(),
            reason: "not found".to_string(),
        })?;
        record.fields.insert(name.into(), value.into());
        Ok(())
    }

    /// Remove a field from an existing node.
    pub fn clear_field(&self, id: NodeId, name: &str) -> LinguaResult<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = tree.records.get_mut(&id).ok_or(StoreError::UpdateFailed {
            id: id.get(),
            reason: "not found".to_string(),
        })?;
        record.fields.remove(name);
        Ok(())
    }

    /// Change the type alias of an existing node.
    pub fn set_type_alias(&self, id: NodeId, type_alias: impl Into<String>) -> LinguaResult<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = tree.records.get_mut(&id).ok_or(StoreError::UpdateFailed {
            id: id.get(),
            reason: "not found".to_string(),
        })?;
        record.type_alias = type_alias.into();
        Ok(())
    }

    /// Move a node (with its subtree) to the end of `new_parent`'s children.
    pub fn move_node(&self, id: NodeId, new_parent: Option<NodeId>) -> LinguaResult<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        if !tree.records.contains_key(&id) {
            return Err(StoreError::UpdateFailed {
                id: id.get(),
                reason: "not found".to_string(),
            }
            .into());
        }
        if let Some(parent_id) = new_parent {
            if parent_id == id || tree.ancestors(parent_id).contains(&id) {
                return Err(StoreError::UpdateFailed {
                    id: id.get(),
                    reason: format!("cannot move under own descendant {}", parent_id),
                }
                .into());
            }
            if !tree.records.contains_key(&parent_id) {
                return Err(StoreError::UpdateFailed {
                    id: id.get(),
                    reason: format!("parent {} not found", parent_id),
                }
                .into());
            }
        }

        tree.detach(id);
        match new_parent {
            Some(parent_id) => {
                if let Some(record) = tree.records.get_mut(&parent_id) {
                    record.children.push(id);
                }
            }
            None => tree.roots.push(id),
        }
        if let Some(record) = tree.records.get_mut(&id) {
            record.parent = new_parent;
        }
        Ok(())
    }

    /// Delete a node and its subtree. Returns the number of nodes removed.
    pub fn remove(&self, id: NodeId) -> LinguaResult<usize> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        tree.detach(id);
        Ok(tree.remove_subtree(id))
    }

    /// Ancestor path of a node, root first. Empty for roots and unknown ids.
    pub fn ancestors(&self, id: NodeId) -> LinguaResult<Vec<NodeId>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.ancestors(id))
    }

    /// Number of nodes in the store.
    pub fn len(&self) -> usize {
        self.tree.read().map(|t| t.records.len()).unwrap_or(0)
    }

    /// True when the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_by_id(&self, id: NodeId) -> LinguaResult<Option<ContentNode>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.materialize(id))
    }
}
