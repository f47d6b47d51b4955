use crate::error::StoreError;
use crate::node::{NodeId, NodeSeed, TreeNode};
use std::collections::HashMap;

/// Partially-loaded tree arena.
///
/// Only explored branches hold materialized children; an unexplored branch is
/// marked unloaded (`children == None`) rather than empty. The arena is
/// mutable and carries a version counter bumped on every mutation, so hosts
/// re-render by comparing versions instead of node identities.
#[derive(Debug, Default)]
pub struct PartialTree {
    /// Ordered root ids, backend order.
    roots: Vec<NodeId>,
    /// All materialized nodes indexed by id.
    nodes: HashMap<NodeId, TreeNode>,
    /// Bumped on every structural or flag mutation.
    version: u64,
}

impl PartialTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every loaded branch.
    pub fn clear(&mut self) {
        if self.roots.is_empty() && self.nodes.is_empty() {
            return;
        }
        self.roots.clear();
        self.nodes.clear();
        self.version += 1;
    }

    /// Replace the whole tree with a fresh root set.
    ///
    /// Roots land unloaded; duplicate ids within the batch are dropped.
    pub fn set_roots(&mut self, seeds: Vec<NodeSeed>) {
        self.roots.clear();
        self.nodes.clear();
        for seed in seeds {
            if self.nodes.contains_key(&seed.id) {
                tracing::warn!("duplicate root id {} in fetch result, skipping", seed.id);
                continue;
            }
            let node = TreeNode::from_seed(seed, None);
            self.roots.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }
        self.version += 1;
    }

    /// Merge fetched children under `parent`, replacing any previously loaded
    /// subtree (the refresh path). Siblings elsewhere in the tree are
    /// untouched; merging is positional by parent id, so out-of-order
    /// completion of unrelated fetches is safe.
    pub fn attach_children(
        &mut self,
        parent: &NodeId,
        seeds: Vec<NodeSeed>,
    ) -> Result<(), StoreError> {
        if !self.nodes.contains_key(parent) {
            return Err(StoreError::UnknownNode(parent.clone()));
        }

        let old = self
            .nodes
            .get_mut(parent)
            .and_then(|node| node.children.take());
        if let Some(old) = old {
            for child in &old {
                self.remove_subtree(child);
            }
        }

        let mut ids = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if self.nodes.contains_key(&seed.id) {
                tracing::warn!("duplicate node id {} in fetch result, skipping", seed.id);
                continue;
            }
            let node = TreeNode::from_seed(seed, Some(parent.clone()));
            ids.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = Some(ids);
        }
        self.version += 1;
        Ok(())
    }

    /// Set a node's expansion flag. Bumps the version only on actual change.
    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> Result<(), StoreError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
        if node.expanded != expanded {
            node.expanded = expanded;
            self.version += 1;
        }
        Ok(())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: &NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes currently materialized.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Root-to-leaf visible rows as `(id, depth)` pairs, honoring expansion
    /// state. Collapsed or unloaded branches contribute only their own row.
    pub fn visible(&self) -> Vec<(NodeId, usize)> {
        let mut rows = Vec::new();
        for root in &self.roots {
            self.collect_visible(root, 0, &mut rows);
        }
        rows
    }

    fn collect_visible(&self, id: &NodeId, depth: usize, rows: &mut Vec<(NodeId, usize)>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        rows.push((id.clone(), depth));
        if node.expanded {
            if let Some(children) = &node.children {
                for child in children {
                    self.collect_visible(child, depth + 1, rows);
                }
            }
        }
    }

    /// Depth-first pre-order traversal over the loaded tree, returning the
    /// first node matching `predicate`. Collapsed branches are still visited;
    /// unloaded ones cannot be.
    pub fn find<P>(&self, predicate: P) -> Option<&TreeNode>
    where
        P: Fn(&TreeNode) -> bool,
    {
        for root in &self.roots {
            if let Some(found) = self.find_in(root, &predicate) {
                return Some(found);
            }
        }
        None
    }

    fn find_in<P>(&self, id: &NodeId, predicate: &P) -> Option<&TreeNode>
    where
        P: Fn(&TreeNode) -> bool,
    {
        let node = self.nodes.get(id)?;
        if predicate(node) {
            return Some(node);
        }
        if let Some(children) = &node.children {
            for child in children {
                if let Some(found) = self.find_in(child, predicate) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Id chain from the root down to `id`, inclusive.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id.clone());
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(&node_id) else {
                return Vec::new();
            };
            chain.push(node_id);
            current = node.parent.clone();
        }
        chain.reverse();
        chain
    }

    /// Depth of a node (roots are 0), or `None` for unknown ids.
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.nodes.get(id)?;
        while let Some(parent) = &current.parent {
            depth += 1;
            current = self.nodes.get(parent)?;
        }
        Some(depth)
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            if let Some(children) = node.children {
                for child in &children {
                    self.remove_subtree(child);
                }
            }
        }
    }
}
