//! Allocation Engine
//!
//! Owns the allocation graph, the process/resource registries and the
//! per-resource waiter queues, and implements allocate, release, deadlock
//! detection and reset on top of them.

use crate::deadlock::{self, DeadlockStatus};
use crate::graph::{AllocationGraph, Edge, EdgeKind, Node};
use crate::metrics::EngineMetrics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on simple cycles enumerated by one detection pass
    pub max_cycles: usize,
    /// Emit a `tracing` event for every detection pass, not only positive ones
    pub log_detection: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10_000,
            log_detection: false,
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Release of a pair that has no active allocation.
///
/// The engine state is left unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseError {
    #[error("No allocation of {resource} to {process} exists")]
    NoAllocation { process: String, resource: String },
}

/// Invalid engine configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_cycles must be at least 1")]
    ZeroCycleLimit,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of an allocate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AllocationOutcome {
    /// The process now holds the resource.
    Granted { process: String, resource: String },
    /// The resource is held by someone else; a request edge was recorded.
    Queued {
        process: String,
        resource: String,
        holder: String,
    },
}

impl AllocationOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AllocationOutcome::Granted { .. })
    }

    /// The process blocking this request, if it was queued.
    pub fn holder(&self) -> Option<&str> {
        match self {
            AllocationOutcome::Granted { .. } => None,
            AllocationOutcome::Queued { holder, .. } => Some(holder),
        }
    }
}

impl fmt::Display for AllocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationOutcome::Granted { process, resource } => {
                write!(f, "Allocated {resource} to {process}")
            }
            AllocationOutcome::Queued {
                process,
                resource,
                holder,
            } => write!(f, "{process} requested {resource} (held by {holder})"),
        }
    }
}

/// Result of a successful release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Released {
    pub process: String,
    pub resource: String,
    /// The waiter that received the resource, if any was queued.
    pub granted_to: Option<String>,
}

impl fmt::Display for Released {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Released {} from {}", self.resource, self.process)
    }
}

/// Confirmation of a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cleared;

impl fmt::Display for Cleared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("All allocations and requests have been cleared")
    }
}

// ============================================================================
// READ-ONLY VIEWS
// ============================================================================

/// How an identifier has been used so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Process,
    Resource,
    /// Seen both as a process and as a resource.
    Both,
    Unknown,
}

/// Everything a renderer needs to draw the graph, with deadlocked parts
/// already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub processes: BTreeSet<String>,
    pub resources: BTreeSet<String>,
    pub deadlock: DeadlockStatus,
    pub deadlocked_nodes: BTreeSet<Node>,
    pub deadlocked_edges: BTreeSet<Edge>,
}

/// Serializable engine state, used for snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub edges: Vec<Edge>,
    pub processes: BTreeSet<String>,
    pub resources: BTreeSet<String>,
    /// Waiters per resource, oldest request first.
    pub waiters: BTreeMap<String, Vec<String>>,
}

// ============================================================================
// ALLOCATION ENGINE
// ============================================================================

/// Single-instance resource allocator with deadlock detection.
///
/// Every operation runs to completion; waiting is represented only as a
/// `Request` edge plus a slot in the resource's FIFO queue.
#[derive(Debug, Default)]
pub struct AllocationEngine {
    graph: AllocationGraph,
    /// Every identifier ever passed as a process, until `clear_all`.
    processes: BTreeSet<String>,
    /// Every identifier ever passed as a resource, until `clear_all`.
    resources: BTreeSet<String>,
    /// Waiters per resource in request order; mirrors the `Request` edges.
    waiters: HashMap<String, VecDeque<String>>,
    config: EngineConfig,
    metrics: Option<EngineMetrics>,
}

impl AllocationEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            graph: AllocationGraph::new(),
            processes: BTreeSet::new(),
            resources: BTreeSet::new(),
            waiters: HashMap::new(),
            config,
            metrics: None,
        }
    }

    pub(crate) fn set_metrics(&mut self, metrics: EngineMetrics) {
        self.metrics = Some(metrics);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_ref()
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Grants `resource` to `process`, or records a request if another
    /// process holds it.
    ///
    /// Repeating the call is a no-op state change with the same outcome.
    pub fn allocate(&mut self, process: &str, resource: &str) -> AllocationOutcome {
        if !self.processes.contains(process) {
            self.processes.insert(process.to_string());
        }
        if !self.resources.contains(resource) {
            self.resources.insert(resource.to_string());
        }

        let outcome = self.arbitrate(process, resource);

        tracing::debug!(process, resource, granted = outcome.is_granted(), "Allocate");
        if let Some(metrics) = &self.metrics {
            match outcome {
                AllocationOutcome::Granted { .. } => metrics.inc_grants(),
                AllocationOutcome::Queued { .. } => metrics.inc_requests_queued(),
            }
        }
        self.record_size();
        outcome
    }

    fn arbitrate(&mut self, process: &str, resource: &str) -> AllocationOutcome {
        if let Some(holder) = self.graph.holder_of(resource) {
            if holder != process {
                self.graph.request(process, resource);
                let queue = self.waiters.entry(resource.to_string()).or_default();
                if !queue.iter().any(|waiter| waiter == process) {
                    queue.push_back(process.to_string());
                }
                return AllocationOutcome::Queued {
                    process: process.to_string(),
                    resource: resource.to_string(),
                    holder,
                };
            }
        }

        // Drop stale waiting state before installing the hold.
        self.graph
            .remove_edge(&Node::process(process), &Node::resource(resource));
        self.dequeue(resource, process);
        self.graph.allocation(resource, process);

        AllocationOutcome::Granted {
            process: process.to_string(),
            resource: resource.to_string(),
        }
    }

    fn dequeue(&mut self, resource: &str, process: &str) {
        if let Some(queue) = self.waiters.get_mut(resource) {
            queue.retain(|waiter| waiter != process);
            if queue.is_empty() {
                self.waiters.remove(resource);
            }
        }
    }

    /// Releases `resource` from `process` and hands it to the oldest waiter.
    ///
    /// Remaining waiters stay queued in their original order. Afterwards
    /// `process` and `resource` are dropped from the graph if they have no
    /// edges left.
    pub fn release(&mut self, process: &str, resource: &str) -> Result<Released, ReleaseError> {
        let process_node = Node::process(process);
        let resource_node = Node::resource(resource);

        if self.graph.edge_kind(&resource_node, &process_node) != Some(EdgeKind::Allocation) {
            tracing::warn!(process, resource, "Release of a pair with no allocation");
            if let Some(metrics) = &self.metrics {
                metrics.inc_releases_failed();
            }
            return Err(ReleaseError::NoAllocation {
                process: process.to_string(),
                resource: resource.to_string(),
            });
        }

        self.graph.remove_edge(&resource_node, &process_node);

        let queued = self.waiters.remove(resource).unwrap_or_default();
        let mut granted_to = None;
        for waiter in queued {
            if self
                .graph
                .remove_edge(&Node::process(&waiter), &resource_node)
                .is_none()
            {
                continue;
            }
            if self.arbitrate(&waiter, resource).is_granted() {
                tracing::info!(resource, from = process, to = %waiter, "Resource handed to waiter");
                if let Some(metrics) = &self.metrics {
                    metrics.inc_handoffs();
                }
                granted_to = Some(waiter);
            }
        }

        self.graph.remove_if_isolated(&process_node);
        self.graph.remove_if_isolated(&resource_node);

        tracing::debug!(process, resource, "Released");
        if let Some(metrics) = &self.metrics {
            metrics.inc_releases();
        }
        self.record_size();

        Ok(Released {
            process: process.to_string(),
            resource: resource.to_string(),
            granted_to,
        })
    }

    /// Looks for cycles that mix holds and requests.
    pub fn detect_deadlock(&self) -> DeadlockStatus {
        let status = deadlock::detect(&self.graph, self.config.max_cycles);

        match &status {
            DeadlockStatus::Deadlocked(report) => {
                tracing::warn!(cycles = report.len(), "Deadlock detected");
            }
            DeadlockStatus::Failed(err) => {
                tracing::error!(error = %err, "Deadlock detection failed");
            }
            DeadlockStatus::Clear => {
                if self.config.log_detection {
                    tracing::debug!(nodes = self.graph.node_count(), "No deadlock");
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.inc_detections();
            match &status {
                DeadlockStatus::Deadlocked(report) => metrics.add_deadlocks(report.len()),
                DeadlockStatus::Failed(_) => metrics.inc_detections_failed(),
                DeadlockStatus::Clear => {}
            }
        }

        status
    }

    /// Drops every node, edge, queue and registered identifier.
    pub fn clear_all(&mut self) -> Cleared {
        self.graph.clear();
        self.processes.clear();
        self.resources.clear();
        self.waiters.clear();

        tracing::info!("Cleared all allocations and requests");
        if let Some(metrics) = &self.metrics {
            metrics.inc_clears();
        }
        self.record_size();
        Cleared
    }

    fn record_size(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_graph_size(self.graph.node_count(), self.graph.edge_count());
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn graph(&self) -> &AllocationGraph {
        &self.graph
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.graph.nodes()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.graph.edges()
    }

    pub fn processes(&self) -> &BTreeSet<String> {
        &self.processes
    }

    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    pub fn holder_of(&self, resource: &str) -> Option<String> {
        self.graph.holder_of(resource)
    }

    /// Processes waiting for `resource`, oldest first.
    pub fn waiters(&self, resource: &str) -> Vec<String> {
        self.waiters
            .get(resource)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn node_role(&self, id: &str) -> NodeRole {
        match (self.processes.contains(id), self.resources.contains(id)) {
            (true, true) => NodeRole::Both,
            (true, false) => NodeRole::Process,
            (false, true) => NodeRole::Resource,
            (false, false) => NodeRole::Unknown,
        }
    }

    /// Builds a read-only view of the graph for rendering.
    pub fn view(&self) -> GraphView {
        let deadlock = deadlock::detect(&self.graph, self.config.max_cycles);
        let (deadlocked_nodes, deadlocked_edges) = match deadlock.report() {
            Some(report) => (report.nodes(), report.edges()),
            None => (BTreeSet::new(), BTreeSet::new()),
        };

        GraphView {
            nodes: self.graph.nodes(),
            edges: self.graph.edges(),
            processes: self.processes.clone(),
            resources: self.resources.clone(),
            deadlock,
            deadlocked_nodes,
            deadlocked_edges,
        }
    }

    // ========================================================================
    // STATE TRANSFER
    // ========================================================================

    pub fn export_state(&self) -> EngineState {
        EngineState {
            edges: self.graph.edges(),
            processes: self.processes.clone(),
            resources: self.resources.clone(),
            waiters: self
                .waiters
                .iter()
                .map(|(resource, queue)| (resource.clone(), queue.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Replaces the current state with `state`.
    ///
    /// The snapshot is not trusted: edges whose direction does not match
    /// their kind, a second holder for a resource, and a request on a pair
    /// that is already allocated are skipped. Waiter queues are rebuilt from
    /// the surviving `Request` edges, keeping the snapshot's order for known
    /// waiters and appending the rest in storage order. A resource left with
    /// waiters but no holder is granted to its oldest waiter.
    pub fn import_state(&mut self, state: EngineState) {
        self.graph.clear();
        self.waiters.clear();

        let (allocations, requests): (Vec<&Edge>, Vec<&Edge>) = state
            .edges
            .iter()
            .partition(|edge| edge.kind == EdgeKind::Allocation);

        for edge in allocations {
            match (&edge.source, &edge.target) {
                (Node::Resource(resource), Node::Process(process)) => {
                    if let Some(holder) = self.graph.holder_of(resource) {
                        tracing::warn!(
                            resource = %resource,
                            holder = %holder,
                            process = %process,
                            "Skipping second holder"
                        );
                        continue;
                    }
                    self.graph.allocation(resource, process);
                }
                _ => tracing::warn!(edge = %edge, kind = ?edge.kind, "Skipping mis-directed edge"),
            }
        }

        for edge in requests {
            match (&edge.source, &edge.target) {
                (Node::Process(process), Node::Resource(resource)) => {
                    let held = self.graph.edge_kind(&edge.target, &edge.source);
                    if held == Some(EdgeKind::Allocation) {
                        tracing::warn!(
                            process = %process,
                            resource = %resource,
                            "Skipping request on a held pair"
                        );
                        continue;
                    }
                    self.graph.request(process, resource);
                }
                _ => tracing::warn!(edge = %edge, kind = ?edge.kind, "Skipping mis-directed edge"),
            }
        }

        let contended: BTreeSet<String> = self
            .graph
            .edges()
            .into_iter()
            .filter(|edge| edge.kind == EdgeKind::Request)
            .map(|edge| edge.target.id().to_string())
            .collect();

        let mut snapshot_waiters = state.waiters;
        for resource in contended {
            let requesters = self.graph.requesters_of(&resource);
            let mut queue: VecDeque<String> = VecDeque::with_capacity(requesters.len());
            for waiter in snapshot_waiters.remove(&resource).unwrap_or_default() {
                if requesters.contains(&waiter) && !queue.contains(&waiter) {
                    queue.push_back(waiter);
                }
            }
            for waiter in requesters {
                if !queue.contains(&waiter) {
                    queue.push_back(waiter);
                }
            }

            if self.graph.holder_of(&resource).is_none() {
                if let Some(oldest) = queue.pop_front() {
                    tracing::warn!(
                        resource = %resource,
                        waiter = %oldest,
                        "Granting unheld resource to oldest waiter"
                    );
                    self.graph
                        .remove_edge(&Node::process(&oldest), &Node::resource(&resource));
                    self.graph.allocation(&resource, &oldest);
                }
            }
            if !queue.is_empty() {
                self.waiters.insert(resource, queue);
            }
        }

        self.processes = state.processes;
        self.resources = state.resources;
        for node in self.graph.nodes() {
            match node {
                Node::Process(id) => self.processes.insert(id),
                Node::Resource(id) => self.resources.insert(id),
            };
        }
        self.record_size();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_free_resource() {
        let mut engine = AllocationEngine::new();
        let outcome = engine.allocate("P1", "R1");

        assert!(outcome.is_granted());
        assert_eq!(outcome.to_string(), "Allocated R1 to P1");
        assert_eq!(engine.holder_of("R1").as_deref(), Some("P1"));
    }

    #[test]
    fn test_allocate_held_resource_queues() {
        let mut engine = AllocationEngine::new();
        engine.allocate("P1", "R1");
        let outcome = engine.allocate("P2", "R1");

        assert_eq!(outcome.holder(), Some("P1"));
        assert_eq!(outcome.to_string(), "P2 requested R1 (held by P1)");
        assert_eq!(engine.waiters("R1"), vec!["P2".to_string()]);
        assert_eq!(
            engine
                .graph()
                .edge_kind(&Node::process("P2"), &Node::resource("R1")),
            Some(EdgeKind::Request)
        );
    }

    #[test]
    fn test_repeated_request_is_recorded_once() {
        let mut engine = AllocationEngine::new();
        engine.allocate("P1", "R1");
        engine.allocate("P2", "R1");
        engine.allocate("P2", "R1");

        assert_eq!(engine.edges().len(), 2);
        assert_eq!(engine.waiters("R1").len(), 1);
    }

    #[test]
    fn test_release_without_allocation() {
        let mut engine = AllocationEngine::new();
        engine.allocate("P1", "R1");

        let err = engine.release("P2", "R1").unwrap_err();
        assert_eq!(err.to_string(), "No allocation of R1 to P2 exists");
        assert_eq!(engine.holder_of("R1").as_deref(), Some("P1"));
    }

    #[test]
    fn test_release_hands_off_in_fifo_order() {
        let mut engine = AllocationEngine::new();
        engine.allocate("P1", "R1");
        engine.allocate("P3", "R1");
        engine.allocate("P2", "R1");

        let released = engine.release("P1", "R1").unwrap();
        assert_eq!(released.to_string(), "Released R1 from P1");
        assert_eq!(released.granted_to.as_deref(), Some("P3"));
        assert_eq!(engine.holder_of("R1").as_deref(), Some("P3"));
        assert_eq!(engine.waiters("R1"), vec!["P2".to_string()]);
        assert!(!engine.graph().contains(&Node::process("P1")));
        assert!(engine.processes().contains("P1"));
    }

    #[test]
    fn test_node_role_uses_registries() {
        let mut engine = AllocationEngine::new();
        engine.allocate("A", "B");
        engine.allocate("B", "C");

        assert_eq!(engine.node_role("A"), NodeRole::Process);
        assert_eq!(engine.node_role("B"), NodeRole::Both);
        assert_eq!(engine.node_role("C"), NodeRole::Resource);
        assert_eq!(engine.node_role("Z"), NodeRole::Unknown);
    }

    #[test]
    fn test_metrics_track_operations() {
        let mut engine = AllocationEngine::new();
        let metrics = EngineMetrics::new("test");
        engine.set_metrics(metrics.clone());

        engine.allocate("P1", "R1");
        engine.allocate("P2", "R1");
        engine.release("P1", "R1").unwrap();
        let _ = engine.release("P1", "R1");
        engine.detect_deadlock();

        assert_eq!(metrics.grants_total(), 1);
        assert_eq!(metrics.requests_queued(), 1);
        assert_eq!(metrics.handoffs_total(), 1);
        assert_eq!(metrics.releases_total(), 1);
        assert_eq!(metrics.releases_failed(), 1);
        assert_eq!(metrics.detections_total(), 1);
        assert_eq!(metrics.nodes(), 2);
        assert_eq!(metrics.edges(), 1);
    }

    #[test]
    fn test_view_leaves_detection_counters_alone() {
        let mut engine = AllocationEngine::new();
        let metrics = EngineMetrics::new("view");
        engine.set_metrics(metrics.clone());

        engine.allocate("P1", "R1");
        engine.allocate("P2", "R2");
        engine.allocate("P1", "R2");
        engine.allocate("P2", "R1");

        let view = engine.view();
        assert!(view.deadlock.is_deadlocked());
        assert_eq!(metrics.detections_total(), 0);
        assert_eq!(metrics.deadlocks_found(), 0);

        engine.detect_deadlock();
        assert_eq!(metrics.detections_total(), 1);
    }

    #[test]
    fn test_export_import_roundtrip_preserves_queues() {
        let mut engine = AllocationEngine::new();
        engine.allocate("P1", "R1");
        engine.allocate("P2", "R1");
        engine.allocate("P3", "R1");
        let state = engine.export_state();

        let mut restored = AllocationEngine::new();
        restored.import_state(state.clone());

        assert_eq!(restored.export_state(), state);
        restored.release("P1", "R1").unwrap();
        assert_eq!(restored.holder_of("R1").as_deref(), Some("P2"));
    }
    fn restore_from(edges: Vec<Edge>) -> AllocationEngine {
        let mut engine = AllocationEngine::new();
        engine.import_state(EngineState {
            edges,
            ..EngineState::default()
        });
        engine
    }

    fn edge(source: Node, target: Node, kind: EdgeKind) -> Edge {
        Edge {
            source,
            target,
            kind,
        }
    }

    #[test]
    fn test_import_keeps_a_single_holder_per_resource() {
        let engine = restore_from(vec![
            edge(Node::resource("R1"), Node::process("P1"), EdgeKind::Allocation),
            edge(Node::resource("R1"), Node::process("P2"), EdgeKind::Allocation),
        ]);

        let holders = engine
            .edges()
            .into_iter()
            .filter(|e| e.kind == EdgeKind::Allocation && e.source == Node::resource("R1"))
            .count();
        assert_eq!(holders, 1);
        assert_eq!(engine.holder_of("R1").as_deref(), Some("P1"));
        assert!(!engine.graph().contains(&Node::process("P2")));
    }

    #[test]
    fn test_import_drops_request_on_allocated_pair() {
        let engine = restore_from(vec![
            edge(Node::process("P1"), Node::resource("R1"), EdgeKind::Request),
            edge(Node::resource("R1"), Node::process("P1"), EdgeKind::Allocation),
        ]);

        assert_eq!(engine.edges().len(), 1);
        assert!(engine.waiters("R1").is_empty());
    }

    #[test]
    fn test_import_rebuilds_missing_queue_entries() {
        let mut engine = restore_from(vec![
            edge(Node::resource("R1"), Node::process("P1"), EdgeKind::Allocation),
            edge(Node::process("P2"), Node::resource("R1"), EdgeKind::Request),
        ]);
        assert_eq!(engine.waiters("R1"), vec!["P2".to_string()]);
        assert!(engine.processes().contains("P2"));

        let released = engine.release("P1", "R1").unwrap();
        assert_eq!(released.granted_to.as_deref(), Some("P2"));
        assert_eq!(engine.holder_of("R1").as_deref(), Some("P2"));
        assert_eq!(
            engine.edges(),
            vec![edge(Node::resource("R1"), Node::process("P2"), EdgeKind::Allocation)]
        );
    }

    #[test]
    fn test_import_drops_queue_entries_without_request() {
        let mut state = EngineState {
            edges: vec![
                edge(Node::resource("R1"), Node::process("P1"), EdgeKind::Allocation),
                edge(Node::process("P3"), Node::resource("R1"), EdgeKind::Request),
                edge(Node::process("P2"), Node::resource("R1"), EdgeKind::Request),
            ],
            ..EngineState::default()
        };
        state.waiters.insert(
            "R1".to_string(),
            vec!["P9".to_string(), "P2".to_string()],
        );

        let mut engine = AllocationEngine::new();
        engine.import_state(state);

        assert_eq!(engine.waiters("R1"), vec!["P2".to_string(), "P3".to_string()]);
    }

    #[test]
    fn test_import_grants_unheld_resource_to_oldest_waiter() {
        let mut state = EngineState {
            edges: vec![
                edge(Node::process("P1"), Node::resource("R1"), EdgeKind::Request),
                edge(Node::process("P2"), Node::resource("R1"), EdgeKind::Request),
            ],
            ..EngineState::default()
        };
        state.waiters.insert(
            "R1".to_string(),
            vec!["P2".to_string(), "P1".to_string()],
        );

        let mut engine = AllocationEngine::new();
        engine.import_state(state);

        assert_eq!(engine.holder_of("R1").as_deref(), Some("P2"));
        assert_eq!(engine.waiters("R1"), vec!["P1".to_string()]);
    }
}
