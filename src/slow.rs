//! Slow source decorator for testing
//!
//! Wraps any [`TreeSource`] and adds configurable delays to simulate a slow
//! backend (congested gateway, cold cache). Also tracks call metrics, which
//! is what the loading-state and fetch-deduplication tests assert against.

use crate::error::FetchError;
use crate::node::NodeSeed;
use crate::source::{FetchScope, TreeSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for slow backend simulation.
#[derive(Debug, Clone)]
pub struct SlowSourceConfig {
    /// Delay applied to `children` fetches.
    pub children_delay: Duration,
    /// Delay applied to `search` fetches.
    pub search_delay: Duration,
}

impl SlowSourceConfig {
    /// Uniform delay for all operations.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            children_delay: delay,
            search_delay: delay,
        }
    }

    /// No delays; pure call counting.
    pub fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }

    /// Roughly what a congested gateway feels like.
    pub fn slow_network() -> Self {
        Self {
            children_delay: Duration::from_millis(500),
            search_delay: Duration::from_millis(300),
        }
    }
}

impl Default for SlowSourceConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Call metrics for a decorated source.
#[derive(Debug, Clone, Default)]
pub struct SourceMetrics {
    /// Number of `children` calls that reached the inner source.
    pub children_calls: usize,
    /// Number of `search` calls that reached the inner source.
    pub search_calls: usize,
    /// Total time spent in artificial delays.
    pub total_delay: Duration,
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_calls(&self) -> usize {
        self.children_calls + self.search_calls
    }
}

/// Slow source wrapper for testing.
///
/// Counts each operation before delaying, so a call shows up in the metrics
/// as soon as it is issued even if the delay is still running.
pub struct SlowSource {
    inner: Arc<dyn TreeSource>,
    config: SlowSourceConfig,
    metrics: Arc<Mutex<SourceMetrics>>,
}

impl SlowSource {
    pub fn new(inner: Arc<dyn TreeSource>, config: SlowSourceConfig) -> Self {
        Self {
            inner,
            config,
            metrics: Arc::new(Mutex::new(SourceMetrics::new())),
        }
    }

    /// Create with uniform delay for all operations.
    pub fn with_uniform_delay(inner: Arc<dyn TreeSource>, delay: Duration) -> Self {
        Self::new(inner, SlowSourceConfig::uniform(delay))
    }

    /// Snapshot of the current metrics.
    pub async fn metrics(&self) -> SourceMetrics {
        self.metrics.lock().await.clone()
    }

    pub async fn reset_metrics(&self) {
        self.metrics.lock().await.reset();
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl TreeSource for SlowSource {
    async fn children(&self, scope: &FetchScope) -> Result<Vec<NodeSeed>, FetchError> {
        {
            let mut metrics = self.metrics.lock().await;
            metrics.children_calls += 1;
            metrics.total_delay += self.config.children_delay;
        }
        self.delay(self.config.children_delay).await;
        self.inner.children(scope).await
    }

    async fn search(
        &self,
        keyword: &str,
        scope: &FetchScope,
    ) -> Result<Vec<NodeSeed>, FetchError> {
        {
            let mut metrics = self.metrics.lock().await;
            metrics.search_calls += 1;
            metrics.total_delay += self.config.search_delay;
        }
        self.delay(self.config.search_delay).await;
        self.inner.search(keyword, scope).await
    }
}
