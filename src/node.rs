use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node within a tree.
///
/// Identifiers are assigned by the backend and treated as opaque strings;
/// uniqueness within one tree is a backend guarantee the store enforces on
/// merge (duplicate ids in a fetch result are dropped).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Category tag carried by every node.
///
/// Which kinds appear under which classification is a backend concern; the
/// store only inspects kinds to honor selection rules and fetch filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Organization,
    Department,
    Domain,
    District,
    BusinessSystem,
    BusinessMatter,
    BusinessForm,
}

impl NodeKind {
    /// Kinds that group other nodes rather than naming a concrete entry.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Organization | Self::Domain | Self::District)
    }
}

/// Top-level grouping mode.
///
/// Switching the classification discards every loaded branch and rebuilds
/// the tree from a fresh root fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Organizational structure: organizations, departments.
    Organization,
    /// Resource classification: domains, districts, business systems.
    ResourceCategory,
}

/// One backend row: the shape a source returns for each fetched node.
///
/// Hosts typically decode REST payloads straight into seeds and hand them to
/// the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSeed {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub is_leaf: bool,
}

impl NodeSeed {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            is_leaf: false,
        }
    }

    /// Mark this seed as a leaf (never expandable).
    pub fn leaf(mut self) -> Self {
        self.is_leaf = true;
        self
    }
}

/// A materialized node in the partial tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Parent node id (`None` for roots).
    pub parent: Option<NodeId>,
    pub is_leaf: bool,
    /// UI expansion state. Orthogonal to loading: a branch can be loaded yet
    /// collapsed.
    pub expanded: bool,
    /// `None` until the first successful expand, `Some(vec![])` once the
    /// backend reported no children. Only `None` triggers a fetch on demand.
    pub children: Option<Vec<NodeId>>,
}

impl TreeNode {
    pub(crate) fn from_seed(seed: NodeSeed, parent: Option<NodeId>) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            kind: seed.kind,
            parent,
            is_leaf: seed.is_leaf,
            expanded: false,
            children: None,
        }
    }

    /// Whether this node's children have been fetched.
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Whether this node can ever hold children.
    pub fn is_expandable(&self) -> bool {
        !self.is_leaf
    }
}
