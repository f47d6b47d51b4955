//! Store configuration shared between the host and the store

use crate::node::NodeKind;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Configuration for a [`TreeStore`](crate::store::TreeStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Whether the host renders an "all" pseudo-root above the real roots.
    /// When set, `initialize` resets the selection to the `All` sentinel;
    /// otherwise the first fetched root is selected.
    #[serde(default = "default_true")]
    pub all_root: bool,

    /// Node kinds that cannot be selected. Selecting one is silently
    /// rejected, the way group headers behave in the host UI.
    #[serde(default)]
    pub disabled_kinds: Vec<NodeKind>,

    /// Kind filter forwarded verbatim to the source with every fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_filter: Option<Vec<NodeKind>>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            all_root: true,
            disabled_kinds: Vec::new(),
            kind_filter: None,
        }
    }
}

impl StoreConfig {
    pub fn is_disabled(&self, kind: NodeKind) -> bool {
        self.disabled_kinds.contains(&kind)
    }
}
