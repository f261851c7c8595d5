//! Engine Metrics
//!
//! Atomic counters and gauges describing allocation traffic and detection
//! results, exportable in Prometheus text format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics for one allocation engine.
///
/// Cloning shares the underlying counters.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    inner: Arc<EngineMetricsInner>,
}

#[derive(Debug)]
struct EngineMetricsInner {
    /// Engine label
    engine: String,

    // Gauges
    nodes: AtomicU64,
    edges: AtomicU64,

    // Counters
    grants_total: AtomicU64,
    requests_queued: AtomicU64,
    releases_total: AtomicU64,
    releases_failed: AtomicU64,
    handoffs_total: AtomicU64,
    detections_total: AtomicU64,
    deadlocks_found: AtomicU64,
    detections_failed: AtomicU64,
    clears_total: AtomicU64,
}

impl EngineMetrics {
    /// Creates a new metrics instance labelled with `engine`.
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EngineMetricsInner {
                engine: engine.into(),
                nodes: AtomicU64::new(0),
                edges: AtomicU64::new(0),
                grants_total: AtomicU64::new(0),
                requests_queued: AtomicU64::new(0),
                releases_total: AtomicU64::new(0),
                releases_failed: AtomicU64::new(0),
                handoffs_total: AtomicU64::new(0),
                detections_total: AtomicU64::new(0),
                deadlocks_found: AtomicU64::new(0),
                detections_failed: AtomicU64::new(0),
                clears_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn engine(&self) -> &str {
        &self.inner.engine
    }

    // ========================================================================
    // GAUGE SETTERS
    // ========================================================================

    /// Records the current graph size.
    pub fn set_graph_size(&self, nodes: usize, edges: usize) {
        self.inner.nodes.store(nodes as u64, Ordering::Relaxed);
        self.inner.edges.store(edges as u64, Ordering::Relaxed);
    }

    // ========================================================================
    // COUNTER INCREMENTERS
    // ========================================================================

    pub fn inc_grants(&self) {
        self.inner.grants_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_queued(&self) {
        self.inner.requests_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_releases(&self) {
        self.inner.releases_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_releases_failed(&self) {
        self.inner.releases_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the counter of resources handed to a waiter on release.
    pub fn inc_handoffs(&self) {
        self.inner.handoffs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_detections(&self) {
        self.inner.detections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the number of deadlocked cycles found by one pass.
    pub fn add_deadlocks(&self, cycles: usize) {
        self.inner
            .deadlocks_found
            .fetch_add(cycles as u64, Ordering::Relaxed);
    }

    pub fn inc_detections_failed(&self) {
        self.inner.detections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_clears(&self) {
        self.inner.clears_total.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // GETTERS (for export)
    // ========================================================================

    pub fn nodes(&self) -> u64 {
        self.inner.nodes.load(Ordering::Relaxed)
    }

    pub fn edges(&self) -> u64 {
        self.inner.edges.load(Ordering::Relaxed)
    }

    pub fn grants_total(&self) -> u64 {
        self.inner.grants_total.load(Ordering::Relaxed)
    }

    pub fn requests_queued(&self) -> u64 {
        self.inner.requests_queued.load(Ordering::Relaxed)
    }

    pub fn releases_total(&self) -> u64 {
        self.inner.releases_total.load(Ordering::Relaxed)
    }

    pub fn releases_failed(&self) -> u64 {
        self.inner.releases_failed.load(Ordering::Relaxed)
    }

    pub fn handoffs_total(&self) -> u64 {
        self.inner.handoffs_total.load(Ordering::Relaxed)
    }

    pub fn detections_total(&self) -> u64 {
        self.inner.detections_total.load(Ordering::Relaxed)
    }

    pub fn deadlocks_found(&self) -> u64 {
        self.inner.deadlocks_found.load(Ordering::Relaxed)
    }

    pub fn detections_failed(&self) -> u64 {
        self.inner.detections_failed.load(Ordering::Relaxed)
    }

    pub fn clears_total(&self) -> u64 {
        self.inner.clears_total.load(Ordering::Relaxed)
    }

    // ========================================================================
    // PROMETHEUS EXPORT
    // ========================================================================

    /// Exports metrics in Prometheus text format.
    pub fn to_prometheus_text(&self) -> String {
        let engine = self.engine();
        let mut output = String::new();

        macro_rules! metric {
            ($kind:expr, $name:expr, $help:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{}{{engine=\"{}\"}} {}\n",
                    $name, $help, $name, $kind, $name, engine, $value
                ));
            };
        }

        // Gauges
        metric!("gauge", "allocation_graph_nodes", "Nodes currently in the graph", self.nodes());
        metric!("gauge", "allocation_graph_edges", "Edges currently in the graph", self.edges());

        // Counters
        metric!(
            "counter",
            "allocation_grants_total",
            "Allocations granted",
            self.grants_total()
        );
        metric!(
            "counter",
            "allocation_requests_queued_total",
            "Requests recorded against a held resource",
            self.requests_queued()
        );
        metric!(
            "counter",
            "allocation_releases_total",
            "Successful releases",
            self.releases_total()
        );
        metric!(
            "counter",
            "allocation_releases_failed_total",
            "Releases of pairs with no allocation",
            self.releases_failed()
        );
        metric!(
            "counter",
            "allocation_handoffs_total",
            "Resources handed to a waiter on release",
            self.handoffs_total()
        );
        metric!(
            "counter",
            "deadlock_detections_total",
            "Deadlock detection passes",
            self.detections_total()
        );
        metric!(
            "counter",
            "deadlock_cycles_found_total",
            "Deadlocked cycles reported",
            self.deadlocks_found()
        );
        metric!(
            "counter",
            "deadlock_detections_failed_total",
            "Detection passes that could not finish",
            self.detections_failed()
        );
        metric!(
            "counter",
            "allocation_clears_total",
            "Full resets",
            self.clears_total()
        );

        output
    }
}
