// Partial tree store for lazily-loaded catalog hierarchies
//
// Only visited branches are materialized in memory: expanding a node fetches
// its children from a host-supplied async source, a keyword search swaps in
// a flat overlay without touching the hierarchy, and a single selection is
// tracked across both views. The store owns all state; transport and
// payload decoding are the host's concern.

pub mod config;
pub mod error;
pub mod event;
pub mod node;
pub mod overlay;
pub mod slow;
pub mod source;
pub mod store;
pub mod tree;

pub use config::StoreConfig;
pub use error::{FetchError, StoreError};
pub use event::{EventQueue, StoreEvent};
pub use node::{Classification, NodeId, NodeKind, NodeSeed, TreeNode};
pub use overlay::{OverlayEntry, SearchOverlay};
pub use slow::{SlowSource, SlowSourceConfig, SourceMetrics};
pub use source::{FetchScope, StaticSource, TreeSource};
pub use store::{Selection, TreeStore};
pub use tree::PartialTree;
