// Shared test sources for the integration tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use treestore::{FetchError, FetchScope, NodeKind, NodeSeed, TreeSource};

pub fn seed(id: &str, name: &str, kind: NodeKind) -> NodeSeed {
    NodeSeed::new(id, name, kind)
}

fn children_key(parent: &str) -> String {
    format!("children:{parent}")
}

fn search_key(keyword: &str) -> String {
    format!("search:{keyword}")
}

/// Decorator that blocks gated fetches until explicitly released, so tests
/// control completion order deterministically. Ungated operations pass
/// straight through.
pub struct GatedSource {
    inner: Arc<dyn TreeSource>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl GatedSource {
    pub fn new(inner: Arc<dyn TreeSource>) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Gate children fetches below `parent` (use `""` for the root fetch).
    pub fn gate_children(&self, parent: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(children_key(parent), Arc::new(Semaphore::new(0)));
    }

    pub fn gate_search(&self, keyword: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(search_key(keyword), Arc::new(Semaphore::new(0)));
    }

    /// Let one gated children fetch below `parent` proceed.
    pub fn release_children(&self, parent: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(&children_key(parent)) {
            gate.add_permits(1);
        }
    }

    pub fn release_search(&self, keyword: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(&search_key(keyword)) {
            gate.add_permits(1);
        }
    }

    async fn wait(&self, key: &str) {
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate dropped").forget();
        }
    }
}

#[async_trait]
impl TreeSource for GatedSource {
    async fn children(&self, scope: &FetchScope) -> Result<Vec<NodeSeed>, FetchError> {
        let parent = scope
            .parent
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        self.wait(&children_key(&parent)).await;
        self.inner.children(scope).await
    }

    async fn search(
        &self,
        keyword: &str,
        scope: &FetchScope,
    ) -> Result<Vec<NodeSeed>, FetchError> {
        self.wait(&search_key(keyword)).await;
        self.inner.search(keyword, scope).await
    }
}

/// Decorator that fails children fetches below chosen parents, for failure
/// and retry tests.
pub struct FlakySource {
    inner: Arc<dyn TreeSource>,
    failing: Mutex<HashSet<String>>,
}

impl FlakySource {
    pub fn new(inner: Arc<dyn TreeSource>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Fail children fetches below `parent` (use `""` for the root fetch).
    pub fn fail_children_of(&self, parent: &str) {
        self.failing.lock().unwrap().insert(parent.to_string());
    }

    pub fn heal(&self, parent: &str) {
        self.failing.lock().unwrap().remove(parent);
    }
}

#[async_trait]
impl TreeSource for FlakySource {
    async fn children(&self, scope: &FetchScope) -> Result<Vec<NodeSeed>, FetchError> {
        let parent = scope
            .parent
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        if self.failing.lock().unwrap().contains(&parent) {
            return Err(FetchError::new("backend offline"));
        }
        self.inner.children(scope).await
    }

    async fn search(
        &self,
        keyword: &str,
        scope: &FetchScope,
    ) -> Result<Vec<NodeSeed>, FetchError> {
        self.inner.search(keyword, scope).await
    }
}
