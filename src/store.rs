// Partial tree store: the async orchestrator over the arena.
//
// State lives behind a mutex that is never held across an await: each
// operation snapshots what it needs, awaits the source, re-locks and
// validates before merging. Validation covers three races:
//   - epoch: bumped by initialize, invalidates every in-flight fetch
//   - pending set: at most one outstanding children fetch per node
//   - search sequence: last-issued search wins the overlay
// Stale completions are discarded silently; they are not errors.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::event::{EventQueue, StoreEvent};
use crate::node::{Classification, NodeId, TreeNode};
use crate::overlay::{OverlayEntry, SearchOverlay};
use crate::source::{FetchScope, TreeSource};
use crate::tree::PartialTree;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// The single selected entry, or the "all" sentinel when the host renders an
/// all pseudo-root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected (only before the first initialize or after one fails).
    #[default]
    None,
    /// The "all" pseudo-root.
    All,
    /// A single node, identified the same way in tree and overlay.
    Node(NodeId),
}

struct State {
    tree: PartialTree,
    classification: Option<Classification>,
    selection: Selection,
    hovered: Option<NodeId>,
    overlay: Option<SearchOverlay>,
    /// Nodes with a children fetch in flight. Node shape does not encode
    /// loading, so it is tracked here.
    pending: HashSet<NodeId>,
    /// Bumped by every initialize; in-flight fetches compare against it.
    epoch: u64,
    /// Monotonic search request counter; only the latest may land.
    search_seq: u64,
}

impl State {
    fn new() -> Self {
        Self {
            tree: PartialTree::new(),
            classification: None,
            selection: Selection::None,
            hovered: None,
            overlay: None,
            pending: HashSet::new(),
            epoch: 0,
            search_seq: 0,
        }
    }
}

struct Shared {
    config: StoreConfig,
    state: Mutex<State>,
    events: EventQueue,
}

/// Store for a partially-loaded catalog tree.
///
/// Cheap to clone; clones share state, so concurrent tasks can expand
/// different branches independently and completions may land in any order.
#[derive(Clone)]
pub struct TreeStore {
    source: Arc<dyn TreeSource>,
    shared: Arc<Shared>,
}

impl TreeStore {
    pub fn new(source: Arc<dyn TreeSource>, config: StoreConfig) -> Self {
        Self {
            source,
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State::new()),
                events: EventQueue::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap()
    }

    fn emit(&self, event: StoreEvent) {
        self.shared.events.emit(event);
    }

    fn scope(&self, classification: Classification, parent: Option<NodeId>) -> FetchScope {
        FetchScope {
            classification,
            parent,
            kind_filter: self.shared.config.kind_filter.clone(),
        }
    }

    /// Clear the tree and load the root set for `classification`.
    ///
    /// Any in-flight fetch from the previous epoch is invalidated: its
    /// eventual completion is discarded. On failure the tree stays empty and
    /// the error is surfaced; there is no partial state to fall back to.
    pub async fn initialize(&self, classification: Classification) -> Result<(), StoreError> {
        let epoch = {
            let mut state = self.state();
            state.epoch += 1;
            state.pending.clear();
            state.tree.clear();
            state.overlay = None;
            state.selection = Selection::None;
            state.hovered = None;
            state.classification = Some(classification);
            state.epoch
        };

        debug!("initializing tree for {:?}", classification);
        let result = self.source.children(&self.scope(classification, None)).await;

        let mut state = self.state();
        if state.epoch != epoch {
            debug!("discarding superseded initialize for {:?}", classification);
            return Ok(());
        }
        match result {
            Err(err) => {
                warn!("root fetch failed for {:?}: {}", classification, err);
                Err(err.into())
            }
            Ok(seeds) => {
                state.tree.set_roots(seeds);
                let selection = if self.shared.config.all_root {
                    Selection::All
                } else {
                    match state.tree.roots().first() {
                        Some(first) => Selection::Node(first.clone()),
                        None => Selection::None,
                    }
                };
                state.selection = selection.clone();
                drop(state);
                self.emit(StoreEvent::Initialized { classification });
                self.emit(StoreEvent::SelectionChanged { selection });
                Ok(())
            }
        }
    }

    /// Fetch and merge the children of `id`.
    ///
    /// No-op when the node is a leaf, already has a `children` value
    /// (including the loaded-empty case) or has a fetch in flight — at most
    /// one fetch per node per load. Failure leaves the node untouched.
    pub async fn expand(&self, id: &NodeId) -> Result<(), StoreError> {
        let (epoch, scope) = {
            let mut state = self.state();
            let node = state
                .tree
                .get(id)
                .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
            if node.is_leaf || node.children.is_some() {
                return Ok(());
            }
            if state.pending.contains(id) {
                debug!("expand of {} already in flight", id);
                return Ok(());
            }
            let Some(classification) = state.classification else {
                return Ok(());
            };
            state.pending.insert(id.clone());
            (state.epoch, self.scope(classification, Some(id.clone())))
        };

        let result = self.source.children(&scope).await;

        let mut state = self.state();
        if state.epoch != epoch {
            // The pending entry died with the old epoch; don't touch the new one.
            debug!("discarding stale expand of {}", id);
            return Ok(());
        }
        state.pending.remove(id);
        match result {
            Err(err) => {
                warn!("children fetch failed for {}: {}", id, err);
                Err(err.into())
            }
            Ok(seeds) => {
                if !state.tree.contains(id) {
                    debug!("node {} vanished while its fetch was in flight", id);
                    return Ok(());
                }
                let count = seeds.len();
                state.tree.attach_children(id, seeds)?;
                state.tree.set_expanded(id, true)?;
                drop(state);
                self.emit(StoreEvent::ChildrenLoaded {
                    parent: id.clone(),
                    count,
                });
                Ok(())
            }
        }
    }

    /// Flip expansion without refetching when children are already loaded;
    /// otherwise delegate to [`expand`](Self::expand).
    ///
    /// While the overlay is active this targets the overlay entry's own
    /// expansion flag, never the hierarchical tree.
    pub async fn toggle_expand(&self, id: &NodeId) -> Result<(), StoreError> {
        {
            let mut state = self.state();
            if let Some(overlay) = &mut state.overlay {
                if let Some(entry) = overlay.get_mut(id) {
                    entry.expanded = !entry.expanded;
                }
                return Ok(());
            }
            let node = state
                .tree
                .get(id)
                .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
            if node.is_leaf {
                return Ok(());
            }
            if node.children.is_some() {
                let next = !node.expanded;
                state.tree.set_expanded(id, next)?;
                return Ok(());
            }
        }
        self.expand(id).await
    }

    /// Re-fetch the children of `id`, replacing its loaded subtree.
    ///
    /// Useful after the host knows backend data changed. Subject to the same
    /// pending and epoch guards as `expand`.
    pub async fn refresh(&self, id: &NodeId) -> Result<(), StoreError> {
        let (epoch, scope) = {
            let mut state = self.state();
            let node = state
                .tree
                .get(id)
                .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
            if node.is_leaf {
                return Ok(());
            }
            if state.pending.contains(id) {
                debug!("refresh of {} already in flight", id);
                return Ok(());
            }
            let Some(classification) = state.classification else {
                return Ok(());
            };
            state.pending.insert(id.clone());
            (state.epoch, self.scope(classification, Some(id.clone())))
        };

        let result = self.source.children(&scope).await;

        let mut state = self.state();
        if state.epoch != epoch {
            debug!("discarding stale refresh of {}", id);
            return Ok(());
        }
        state.pending.remove(id);
        match result {
            Err(err) => {
                warn!("refresh fetch failed for {}: {}", id, err);
                Err(err.into())
            }
            Ok(seeds) => {
                if !state.tree.contains(id) {
                    return Ok(());
                }
                let count = seeds.len();
                state.tree.attach_children(id, seeds)?;
                state.tree.set_expanded(id, true)?;
                drop(state);
                self.emit(StoreEvent::ChildrenLoaded {
                    parent: id.clone(),
                    count,
                });
                Ok(())
            }
        }
    }

    /// Run a flattened search, or clear it.
    ///
    /// An empty keyword removes the overlay and restores the hierarchical
    /// view with the selection that was current when the overlay activated.
    /// A non-empty keyword fetches a flat result set; when several searches
    /// race, only the last-issued one lands (superseded completions are
    /// discarded silently).
    pub async fn search(&self, keyword: &str) -> Result<(), StoreError> {
        if keyword.is_empty() {
            let mut state = self.state();
            // Invalidate any in-flight search; its completion must not
            // resurrect the overlay after the keyword was cleared.
            state.search_seq += 1;
            if let Some(overlay) = state.overlay.take() {
                state.selection = overlay.saved_selection().clone();
                let selection = state.selection.clone();
                drop(state);
                self.emit(StoreEvent::OverlayCleared);
                self.emit(StoreEvent::SelectionChanged { selection });
            }
            return Ok(());
        }

        let (epoch, seq, scope) = {
            let mut state = self.state();
            let Some(classification) = state.classification else {
                return Ok(());
            };
            state.search_seq += 1;
            (state.epoch, state.search_seq, self.scope(classification, None))
        };

        let result = self.source.search(keyword, &scope).await;

        let mut state = self.state();
        if state.epoch != epoch || state.search_seq != seq {
            debug!("discarding superseded search for \"{}\"", keyword);
            return Ok(());
        }
        match result {
            Err(err) => {
                warn!("search fetch failed for \"{}\": {}", keyword, err);
                Err(err.into())
            }
            Ok(seeds) => {
                let st = &mut *state;
                let count = match st.overlay.as_mut() {
                    Some(overlay) => {
                        overlay.replace(keyword, seeds);
                        overlay.len()
                    }
                    None => {
                        let overlay =
                            SearchOverlay::new(keyword, seeds, st.selection.clone());
                        let count = overlay.len();
                        st.overlay = Some(overlay);
                        count
                    }
                };
                drop(state);
                self.emit(StoreEvent::OverlayUpdated {
                    keyword: keyword.to_string(),
                    count,
                });
                Ok(())
            }
        }
    }

    /// Select a node. Silent no-op when already selected, unknown, or of a
    /// disabled kind. While the overlay is active the lookup targets overlay
    /// identity, not the hierarchical tree.
    pub fn select(&self, id: &NodeId) {
        let mut state = self.state();
        if state.selection == Selection::Node(id.clone()) {
            return;
        }
        let kind = if let Some(overlay) = &state.overlay {
            match overlay.get(id) {
                Some(entry) => entry.kind,
                None => return,
            }
        } else {
            match state.tree.get(id) {
                Some(node) => node.kind,
                None => return,
            }
        };
        if self.shared.config.is_disabled(kind) {
            debug!("selection of {} rejected: {:?} is disabled", id, kind);
            return;
        }
        state.selection = Selection::Node(id.clone());
        let selection = state.selection.clone();
        drop(state);
        self.emit(StoreEvent::SelectionChanged { selection });
    }

    /// Select the "all" pseudo-root. No-op unless the store is configured
    /// with one.
    pub fn select_all(&self) {
        if !self.shared.config.all_root {
            return;
        }
        let mut state = self.state();
        if state.selection == Selection::All {
            return;
        }
        state.selection = Selection::All;
        drop(state);
        self.emit(StoreEvent::SelectionChanged {
            selection: Selection::All,
        });
    }

    /// Track the hovered node. Pure UI affordance: never persisted, never
    /// emitted.
    pub fn hover(&self, id: Option<NodeId>) {
        self.state().hovered = id;
    }

    /// Expand along a root-to-target chain of ids, then select the target.
    ///
    /// Returns `false` when the chain breaks (a link is missing from the
    /// tree, which also happens when a fetch along the way is still in
    /// flight or was invalidated).
    pub async fn reveal(&self, path: &[NodeId]) -> Result<bool, StoreError> {
        let Some((target, prefix)) = path.split_last() else {
            return Ok(false);
        };
        for id in prefix {
            if !self.state().tree.contains(id) {
                return Ok(false);
            }
            self.expand(id).await?;
            {
                let mut state = self.state();
                if !state.tree.contains(id) {
                    return Ok(false);
                }
                // expand() leaves the flag untouched when children were
                // already loaded.
                state.tree.set_expanded(id, true)?;
            }
        }
        if !self.state().tree.contains(target) {
            return Ok(false);
        }
        self.select(target);
        Ok(true)
    }

    /// First loaded node matching `predicate`, depth-first pre-order over
    /// the hierarchical tree (never the overlay).
    pub fn find_node<P>(&self, predicate: P) -> Option<TreeNode>
    where
        P: Fn(&TreeNode) -> bool,
    {
        self.state().tree.find(&predicate).cloned()
    }

    // --- read accessors -------------------------------------------------

    /// Handle for draining notifications.
    pub fn events(&self) -> EventQueue {
        self.shared.events.clone()
    }

    pub fn selection(&self) -> Selection {
        self.state().selection.clone()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.state().hovered.clone()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.state().classification
    }

    /// Tree version; bumped on every structural or flag mutation.
    pub fn version(&self) -> u64 {
        self.state().tree.version()
    }

    pub fn node_count(&self) -> usize {
        self.state().tree.node_count()
    }

    /// Snapshot of a node, if loaded.
    pub fn node(&self, id: &NodeId) -> Option<TreeNode> {
        self.state().tree.get(id).cloned()
    }

    /// Hierarchical visible rows as `(id, depth)` pairs. While a search is
    /// active the host should render [`overlay_entries`](Self::overlay_entries)
    /// instead.
    pub fn visible(&self) -> Vec<(NodeId, usize)> {
        self.state().tree.visible()
    }

    /// The flat overlay rows, while a search keyword is active.
    pub fn overlay_entries(&self) -> Option<Vec<OverlayEntry>> {
        self.state()
            .overlay
            .as_ref()
            .map(|overlay| overlay.entries().to_vec())
    }

    /// The active search keyword, if any.
    pub fn keyword(&self) -> Option<String> {
        self.state()
            .overlay
            .as_ref()
            .map(|overlay| overlay.keyword().to_string())
    }

    pub fn search_active(&self) -> bool {
        self.state().overlay.is_some()
    }

    /// Id chain from the root down to `id`, inclusive; empty for unknown ids.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        self.state().tree.ancestors(id)
    }

    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        self.state().tree.depth(id)
    }
}
