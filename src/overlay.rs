use crate::node::{NodeId, NodeKind, NodeSeed};
use crate::store::Selection;

/// A flattened search result entry.
///
/// Overlay entries are decoupled from the hierarchical `children` relation;
/// they carry their own expansion flag, which starts false and survives a
/// re-triggered search for entries that stay in the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub is_leaf: bool,
    pub expanded: bool,
}

impl OverlayEntry {
    fn from_seed(seed: NodeSeed) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            kind: seed.kind,
            is_leaf: seed.is_leaf,
            expanded: false,
        }
    }
}

/// The flat result set that replaces the hierarchical view while a search
/// keyword is active.
///
/// The overlay never mutates the underlying tree. It remembers the
/// hierarchical selection that was current when it first activated, so
/// clearing the keyword restores the exact pre-search state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOverlay {
    keyword: String,
    entries: Vec<OverlayEntry>,
    saved_selection: Selection,
}

impl SearchOverlay {
    pub(crate) fn new(
        keyword: impl Into<String>,
        seeds: Vec<NodeSeed>,
        saved_selection: Selection,
    ) -> Self {
        let mut overlay = Self {
            keyword: String::new(),
            entries: Vec::new(),
            saved_selection,
        };
        overlay.replace(keyword, seeds);
        overlay
    }

    /// Swap in a new result set for a re-triggered search.
    ///
    /// Entries whose id was already present keep their expansion flag; new
    /// entries start collapsed. Backend order is preserved, duplicate ids in
    /// one batch are dropped.
    pub(crate) fn replace(&mut self, keyword: impl Into<String>, seeds: Vec<NodeSeed>) {
        let previous = std::mem::take(&mut self.entries);
        self.keyword = keyword.into();
        for seed in seeds {
            if self.entries.iter().any(|entry| entry.id == seed.id) {
                tracing::warn!("duplicate node id {} in search result, skipping", seed.id);
                continue;
            }
            let mut entry = OverlayEntry::from_seed(seed);
            if let Some(old) = previous.iter().find(|old| old.id == entry.id) {
                entry.expanded = old.expanded;
            }
            self.entries.push(entry);
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Entries in backend order; the store never re-sorts them.
    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn get(&self, id: &NodeId) -> Option<&OverlayEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &NodeId) -> Option<&mut OverlayEntry> {
        self.entries.iter_mut().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The hierarchical selection to restore when the keyword clears.
    pub fn saved_selection(&self) -> &Selection {
        &self.saved_selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds() -> Vec<NodeSeed> {
        vec![
            NodeSeed::new("c1", "Dept1", NodeKind::Department),
            NodeSeed::new("c2", "Dept2", NodeKind::Department),
        ]
    }

    #[test]
    fn test_entries_start_collapsed_in_backend_order() {
        let overlay = SearchOverlay::new("dept", seeds(), Selection::All);
        assert_eq!(overlay.keyword(), "dept");
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.entries()[0].id, NodeId::new("c1"));
        assert!(overlay.entries().iter().all(|entry| !entry.expanded));
        assert_eq!(overlay.saved_selection(), &Selection::All);
    }

    #[test]
    fn test_replace_preserves_expansion_for_surviving_ids() {
        let mut overlay = SearchOverlay::new("dept", seeds(), Selection::All);
        overlay.get_mut(&NodeId::new("c1")).unwrap().expanded = true;

        overlay.replace(
            "dept1",
            vec![
                NodeSeed::new("c1", "Dept1", NodeKind::Department),
                NodeSeed::new("c3", "Dept1 annex", NodeKind::Department),
            ],
        );

        assert_eq!(overlay.keyword(), "dept1");
        assert!(overlay.get(&NodeId::new("c1")).unwrap().expanded);
        assert!(!overlay.get(&NodeId::new("c3")).unwrap().expanded);
        assert!(!overlay.contains(&NodeId::new("c2")));
    }

    #[test]
    fn test_duplicate_search_ids_dropped() {
        let overlay = SearchOverlay::new(
            "dup",
            vec![
                NodeSeed::new("c1", "Dept1", NodeKind::Department),
                NodeSeed::new("c1", "Dept1 shadow", NodeKind::Department),
            ],
            Selection::None,
        );
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.entries()[0].name, "Dept1");
    }
}
