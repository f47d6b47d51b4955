//! Store notifications consumed by sibling panels
//!
//! The store pushes a typed event after every observable state change;
//! consumers (a details pane keyed off the selection, a breadcrumb bar)
//! drain the queue after each batch of operations. The queue is bounded:
//! when history overflows, the oldest events are dropped first.

use crate::node::{Classification, NodeId};
use crate::store::Selection;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A notification emitted by the store after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A classification was (re)initialized and its roots loaded.
    Initialized { classification: Classification },
    /// Children were fetched and merged under `parent`.
    ChildrenLoaded { parent: NodeId, count: usize },
    /// The selection changed.
    SelectionChanged { selection: Selection },
    /// The search overlay was replaced with results for `keyword`.
    OverlayUpdated { keyword: String, count: usize },
    /// The keyword was cleared and the hierarchical view restored.
    OverlayCleared,
}

/// Bounded queue of store notifications.
#[derive(Clone)]
pub struct EventQueue {
    events: Arc<Mutex<VecDeque<StoreEvent>>>,
    max_history: usize,
}

impl EventQueue {
    pub fn new(max_history: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_history))),
            max_history,
        }
    }

    /// Push an event, dropping the oldest when history is full.
    pub(crate) fn emit(&self, event: StoreEvent) {
        let mut events = self.events.lock().unwrap();
        if events.len() >= self.max_history {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Take all pending events.
    pub fn drain(&self) -> Vec<StoreEvent> {
        let mut events = self.events.lock().unwrap();
        events.drain(..).collect()
    }

    /// Look at pending events without consuming them.
    pub fn peek(&self) -> Vec<StoreEvent> {
        let events = self.events.lock().unwrap();
        events.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}
