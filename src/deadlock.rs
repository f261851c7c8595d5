//! Deadlock Detection
//!
//! Enumerates every simple cycle of an [`AllocationGraph`] and keeps the ones
//! that mix holds and waits. In a single-instance resource model a cycle with
//! at least one `Allocation` and one `Request` edge is a deadlock; cycles made
//! of a single edge kind are never reported.
//!
//! Cycles are found by depth-first search with an explicit path stack. Each
//! search is rooted at a node and only descends into nodes that sort after
//! it, so every cycle is emitted exactly once, starting from its smallest
//! node.

use crate::graph::{AllocationGraph, Edge, EdgeKind, Node};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure while enumerating cycles.
///
/// This is a distinct outcome from "no deadlock": the graph was not fully
/// examined.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionError {
    #[error("cycle enumeration exceeded the limit of {limit} cycles")]
    CycleLimitExceeded { limit: usize },
    #[error("graph index {0} has no node")]
    DanglingIndex(usize),
}

// ============================================================================
// REPORT TYPES
// ============================================================================

/// One deadlocked cycle, in cycle order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockCycle {
    /// Nodes in walk order; the last node links back to the first.
    pub nodes: Vec<Node>,
    /// The edges found between consecutive nodes.
    pub edges: Vec<Edge>,
}

impl DeadlockCycle {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// Processes taking part in this cycle.
    pub fn processes(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|node| node.is_process())
            .map(Node::id)
    }
}

impl fmt::Display for DeadlockCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, edge) in self.edges.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{edge}")?;
        }
        f.write_str("]")
    }
}

/// All deadlocked cycles found by one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockReport {
    pub cycles: Vec<DeadlockCycle>,
}

impl DeadlockReport {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Every node that sits on at least one deadlocked cycle.
    pub fn nodes(&self) -> BTreeSet<Node> {
        self.cycles
            .iter()
            .flat_map(|cycle| cycle.nodes.iter().cloned())
            .collect()
    }

    /// Every edge that sits on at least one deadlocked cycle.
    pub fn edges(&self) -> BTreeSet<Edge> {
        self.cycles
            .iter()
            .flat_map(|cycle| cycle.edges.iter().cloned())
            .collect()
    }
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deadlock Detected! Cycles: [")?;
        for (i, cycle) in self.cycles.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cycle}")?;
        }
        f.write_str("]")
    }
}

/// Outcome of a detection pass.
///
/// `Clear` and `Failed` are both negative answers but must not be conflated:
/// only `Clear` means the whole graph was examined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeadlockStatus {
    Deadlocked(DeadlockReport),
    Clear,
    Failed(DetectionError),
}

impl DeadlockStatus {
    pub fn is_deadlocked(&self) -> bool {
        matches!(self, DeadlockStatus::Deadlocked(_))
    }

    pub fn report(&self) -> Option<&DeadlockReport> {
        match self {
            DeadlockStatus::Deadlocked(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DetectionError> {
        match self {
            DeadlockStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// The `(detected, message)` pair handed to text-oriented callers.
    pub fn to_pair(&self) -> (bool, String) {
        (self.is_deadlocked(), self.to_string())
    }
}

impl fmt::Display for DeadlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadlockStatus::Deadlocked(report) => write!(f, "{report}"),
            DeadlockStatus::Clear => f.write_str("No Deadlock Detected"),
            DeadlockStatus::Failed(err) => write!(f, "Error in deadlock detection: {err}"),
        }
    }
}

// ============================================================================
// CYCLE ENUMERATION
// ============================================================================

struct CycleSearch<'g> {
    graph: &'g StableDiGraph<Node, EdgeKind>,
    rank: HashMap<NodeIndex, usize>,
    limit: usize,
    path: Vec<NodeIndex>,
    on_path: HashSet<NodeIndex>,
    cycles: Vec<Vec<NodeIndex>>,
}

impl CycleSearch<'_> {
    fn rank_of(&self, idx: NodeIndex) -> Result<usize, DetectionError> {
        self.rank
            .get(&idx)
            .copied()
            .ok_or(DetectionError::DanglingIndex(idx.index()))
    }

    fn visit(
        &mut self,
        start: NodeIndex,
        start_rank: usize,
        node: NodeIndex,
    ) -> Result<(), DetectionError> {
        self.path.push(node);
        self.on_path.insert(node);

        let mut successors = Vec::new();
        for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
            successors.push((self.rank_of(succ)?, succ));
        }
        successors.sort_unstable();

        for (rank, succ) in successors {
            if succ == start {
                if self.cycles.len() >= self.limit {
                    return Err(DetectionError::CycleLimitExceeded { limit: self.limit });
                }
                self.cycles.push(self.path.clone());
            } else if rank > start_rank && !self.on_path.contains(&succ) {
                self.visit(start, start_rank, succ)?;
            }
        }

        self.path.pop();
        self.on_path.remove(&node);
        Ok(())
    }
}

/// Enumerates every simple cycle of `graph` as a list of nodes.
///
/// Output is deterministic: cycles are grouped by their smallest node and
/// walked in node order. Fails once more than `limit` cycles are found.
pub fn enumerate_simple_cycles(
    graph: &AllocationGraph,
    limit: usize,
) -> Result<Vec<Vec<Node>>, DetectionError> {
    let inner = graph.inner();

    let mut order: Vec<(&Node, NodeIndex)> = Vec::with_capacity(inner.node_count());
    for idx in inner.node_indices() {
        let node = inner
            .node_weight(idx)
            .ok_or(DetectionError::DanglingIndex(idx.index()))?;
        order.push((node, idx));
    }
    order.sort();

    let mut search = CycleSearch {
        graph: inner,
        rank: order
            .iter()
            .enumerate()
            .map(|(rank, (_, idx))| (*idx, rank))
            .collect(),
        limit,
        path: Vec::new(),
        on_path: HashSet::new(),
        cycles: Vec::new(),
    };

    for (rank, (_, idx)) in order.iter().enumerate() {
        search.visit(*idx, rank, *idx)?;
    }

    search
        .cycles
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .map(|idx| {
                    inner
                        .node_weight(idx)
                        .cloned()
                        .ok_or(DetectionError::DanglingIndex(idx.index()))
                })
                .collect()
        })
        .collect()
}

/// Returns the cycle as a [`DeadlockCycle`] if its edges mix holds and
/// waits, `None` otherwise.
pub fn classify(graph: &AllocationGraph, cycle: &[Node]) -> Option<DeadlockCycle> {
    let mut has_allocation = false;
    let mut has_request = false;
    let mut edges = Vec::with_capacity(cycle.len());

    for (i, source) in cycle.iter().enumerate() {
        let target = &cycle[(i + 1) % cycle.len()];
        if let Some(kind) = graph.edge_kind(source, target) {
            match kind {
                EdgeKind::Allocation => has_allocation = true,
                EdgeKind::Request => has_request = true,
            }
            edges.push(Edge {
                source: source.clone(),
                target: target.clone(),
                kind,
            });
        }
    }

    (has_allocation && has_request).then(|| DeadlockCycle {
        nodes: cycle.to_vec(),
        edges,
    })
}

/// Runs a full detection pass over `graph`.
pub fn detect(graph: &AllocationGraph, max_cycles: usize) -> DeadlockStatus {
    match enumerate_simple_cycles(graph, max_cycles) {
        Ok(cycles) => {
            let deadlocked: Vec<DeadlockCycle> = cycles
                .iter()
                .filter_map(|cycle| classify(graph, cycle))
                .collect();
            if deadlocked.is_empty() {
                DeadlockStatus::Clear
            } else {
                DeadlockStatus::Deadlocked(DeadlockReport { cycles: deadlocked })
            }
        }
        Err(err) => DeadlockStatus::Failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// P1 holds R1 and wants R2, P2 holds R2 and wants R1.
    fn crossed_pair() -> AllocationGraph {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.allocation("R2", "P2");
        graph.request("P1", "R2");
        graph.request("P2", "R1");
        graph
    }

    #[test]
    fn test_enumerates_single_cycle_once() {
        let graph = crossed_pair();
        let cycles = enumerate_simple_cycles(&graph, 100).unwrap();

        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0],
            vec![
                Node::process("P1"),
                Node::resource("R2"),
                Node::process("P2"),
                Node::resource("R1"),
            ]
        );
    }

    #[test]
    fn test_mixed_cycle_is_deadlock() {
        let graph = crossed_pair();
        let status = detect(&graph, 100);

        let report = status.report().expect("deadlock expected");
        assert_eq!(report.len(), 1);
        assert_eq!(report.cycles[0].edges.len(), 4);
        assert_eq!(report.edges().len(), 4);
        assert_eq!(report.cycles[0].processes().collect::<Vec<_>>(), vec!["P1", "P2"]);
    }

    #[test]
    fn test_acyclic_graph_is_clear() {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.allocation("R2", "P2");
        graph.request("P1", "R2");

        assert_eq!(detect(&graph, 100), DeadlockStatus::Clear);
    }

    #[test]
    fn test_classify_requires_both_edge_kinds() {
        // Hold chain that closes into a real cycle: R1 -> P1 -> R2 -> P2 -> R1.
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.request("P1", "R2");
        graph.allocation("R2", "P2");
        graph.request("P2", "R1");

        let cycles = enumerate_simple_cycles(&graph, 100).unwrap();
        assert_eq!(cycles.len(), 1);
        assert!(classify(&graph, &cycles[0]).is_some());

        // Only the request edges of that walk remain.
        graph.remove_edge(&Node::resource("R1"), &Node::process("P1"));
        graph.remove_edge(&Node::resource("R2"), &Node::process("P2"));
        assert!(classify(&graph, &cycles[0]).is_none());

        // Only the allocation edges remain.
        graph.allocation("R1", "P1");
        graph.allocation("R2", "P2");
        graph.remove_edge(&Node::process("P1"), &Node::resource("R2"));
        graph.remove_edge(&Node::process("P2"), &Node::resource("R1"));
        assert!(classify(&graph, &cycles[0]).is_none());
    }

    #[test]
    fn test_limit_surfaces_as_failure() {
        let graph = crossed_pair();
        let status = detect(&graph, 0);

        assert!(!status.is_deadlocked());
        assert_eq!(
            status.error(),
            Some(&DetectionError::CycleLimitExceeded { limit: 0 })
        );
        assert!(status
            .to_string()
            .starts_with("Error in deadlock detection:"));
    }

    #[test]
    fn test_report_text() {
        let status = detect(&crossed_pair(), 100);
        assert_eq!(
            status.to_string(),
            "Deadlock Detected! Cycles: [[(P1, R2), (R2, P2), (P2, R1), (R1, P1)]]"
        );
        assert_eq!(DeadlockStatus::Clear.to_pair(), (false, "No Deadlock Detected".to_string()));
    }
}
