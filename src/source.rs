// Source abstraction: the only collaborator interface the store depends on.
//
// Transport, authentication and payload decoding are the host's concern; a
// source just answers "children of this node" and "flat matches for this
// keyword" with ordered seed sequences.

use crate::error::FetchError;
use crate::node::{Classification, NodeId, NodeKind, NodeSeed};
use async_trait::async_trait;
use std::collections::HashMap;

/// Scope parameters forwarded to every source call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchScope {
    /// The active top-level grouping mode.
    pub classification: Classification,
    /// Parent node to fetch below; `None` requests the root set.
    pub parent: Option<NodeId>,
    /// Optional kind filter, taken verbatim from the store configuration.
    pub kind_filter: Option<Vec<NodeKind>>,
}

/// Asynchronous provider of tree data.
///
/// Both operations return seeds in backend order; the store never re-sorts.
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Fetch the ordered children for `scope.parent` (the roots when `None`).
    async fn children(&self, scope: &FetchScope) -> Result<Vec<NodeSeed>, FetchError>;

    /// Fetch a flattened, ordered result set for `keyword` within `scope`.
    async fn search(&self, keyword: &str, scope: &FetchScope)
        -> Result<Vec<NodeSeed>, FetchError>;
}

/// In-memory source backed by fixed seed data.
///
/// Register each parent's children up front; `search` does case-insensitive
/// substring matching on names over every registered seed, in registration
/// order. Useful for fixtures, demos and tests.
#[derive(Debug, Default)]
pub struct StaticSource {
    roots: Vec<NodeSeed>,
    children: HashMap<NodeId, Vec<NodeSeed>>,
    /// Flattened registration order, searched in order.
    all: Vec<NodeSeed>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(mut self, seeds: Vec<NodeSeed>) -> Self {
        self.all.extend(seeds.iter().cloned());
        self.roots = seeds;
        self
    }

    pub fn with_children(mut self, parent: impl Into<NodeId>, seeds: Vec<NodeSeed>) -> Self {
        self.all.extend(seeds.iter().cloned());
        self.children.insert(parent.into(), seeds);
        self
    }
}

#[async_trait]
impl TreeSource for StaticSource {
    async fn children(&self, scope: &FetchScope) -> Result<Vec<NodeSeed>, FetchError> {
        Ok(match &scope.parent {
            None => self.roots.clone(),
            Some(parent) => self.children.get(parent).cloned().unwrap_or_default(),
        })
    }

    async fn search(
        &self,
        keyword: &str,
        _scope: &FetchScope,
    ) -> Result<Vec<NodeSeed>, FetchError> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .all
            .iter()
            .filter(|seed| seed.name.to_lowercase().contains(&keyword))
            .cloned()
            .collect())
    }
}
