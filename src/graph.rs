//! Typed Resource-Allocation Graph
//!
//! Storage for the allocation graph: a `petgraph` stable directed graph whose
//! nodes are tagged process/resource identifiers and whose edges carry an
//! [`EdgeKind`].
//!
//! - `Allocation` edges always point resource -> process (current holder).
//! - `Request` edges always point process -> resource (pending request).
//!
//! Edges are only created through [`AllocationGraph::allocation`] and
//! [`AllocationGraph::request`], so a mis-directed edge cannot be stored.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A node of the allocation graph.
///
/// The same identifier used once as a process and once as a resource yields
/// two distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Node {
    Process(String),
    Resource(String),
}

impl Node {
    pub fn process(id: impl Into<String>) -> Self {
        Node::Process(id.into())
    }

    pub fn resource(id: impl Into<String>) -> Self {
        Node::Resource(id.into())
    }

    /// Returns the raw identifier, without its kind.
    pub fn id(&self) -> &str {
        match self {
            Node::Process(id) | Node::Resource(id) => id,
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self, Node::Process(_))
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Node::Resource(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Tag carried by every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Resource -> Process: the process holds the resource.
    Allocation,
    /// Process -> Resource: the process waits for the resource.
    Request,
}

/// An edge together with its endpoints, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: Node,
    pub target: Node,
    pub kind: EdgeKind,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source, self.target)
    }
}

/// A directed graph of holds and requests.
///
/// At most one edge exists per ordered pair of nodes; writing an edge for an
/// existing pair replaces its kind.
#[derive(Debug, Default, Clone)]
pub struct AllocationGraph {
    /// The underlying graph structure.
    graph: StableDiGraph<Node, EdgeKind>,
    /// Map to quickly look up graph indices.
    node_map: HashMap<Node, NodeIndex>,
}

impl AllocationGraph {
    /// Creates a new, empty allocation graph.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Returns the index of `node`, inserting it if absent.
    pub fn ensure_node(&mut self, node: &Node) -> NodeIndex {
        *self
            .node_map
            .entry(node.clone())
            .or_insert_with(|| self.graph.add_node(node.clone()))
    }

    pub fn index_of(&self, node: &Node) -> Option<NodeIndex> {
        self.node_map.get(node).copied()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.node_map.contains_key(node)
    }

    /// Records that `process` holds `resource`.
    pub fn allocation(&mut self, resource: &str, process: &str) {
        self.set_edge(
            &Node::resource(resource),
            &Node::process(process),
            EdgeKind::Allocation,
        );
    }

    /// Records that `process` waits for `resource`.
    pub fn request(&mut self, process: &str, resource: &str) {
        self.set_edge(
            &Node::process(process),
            &Node::resource(resource),
            EdgeKind::Request,
        );
    }

    fn set_edge(&mut self, source: &Node, target: &Node, kind: EdgeKind) {
        let source_idx = self.ensure_node(source);
        let target_idx = self.ensure_node(target);
        self.graph.update_edge(source_idx, target_idx, kind);
    }

    /// Removes the edge `source -> target`, returning its kind if it existed.
    pub fn remove_edge(&mut self, source: &Node, target: &Node) -> Option<EdgeKind> {
        let (source_idx, target_idx) = (self.index_of(source)?, self.index_of(target)?);
        let edge = self.graph.find_edge(source_idx, target_idx)?;
        self.graph.remove_edge(edge)
    }

    /// Returns the kind of the edge `source -> target`, if any.
    pub fn edge_kind(&self, source: &Node, target: &Node) -> Option<EdgeKind> {
        let (source_idx, target_idx) = (self.index_of(source)?, self.index_of(target)?);
        self.kind_between(source_idx, target_idx)
    }

    pub(crate) fn kind_between(&self, source: NodeIndex, target: NodeIndex) -> Option<EdgeKind> {
        self.graph
            .find_edge(source, target)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    /// Returns the process currently holding `resource`.
    pub fn holder_of(&self, resource: &str) -> Option<String> {
        let idx = self.index_of(&Node::resource(resource))?;
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .find(|edge| *edge.weight() == EdgeKind::Allocation)
            .and_then(|edge| self.graph.node_weight(edge.target()))
            .map(|node| node.id().to_string())
    }

    /// Returns every process with a pending request on `resource`, in
    /// storage order.
    pub fn requesters_of(&self, resource: &str) -> Vec<String> {
        let Some(idx) = self.index_of(&Node::resource(resource)) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|edge| *edge.weight() == EdgeKind::Request)
            .filter_map(|edge| self.graph.node_weight(edge.source()))
            .map(|node| node.id().to_string())
            .collect()
    }

    /// Number of incoming plus outgoing edges of `node`.
    pub fn degree(&self, node: &Node) -> usize {
        let Some(idx) = self.index_of(node) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Outgoing).count()
            + self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Drops `node` from the graph if it has no incident edges.
    ///
    /// Returns true if the node was removed.
    pub fn remove_if_isolated(&mut self, node: &Node) -> bool {
        let Some(idx) = self.index_of(node) else {
            return false;
        };
        if self.degree(node) > 0 {
            return false;
        }
        self.graph.remove_node(idx);
        self.node_map.remove(node);
        true
    }

    /// All nodes currently present, sorted.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.node_map.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// All edges currently present, sorted by endpoints.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .edge_indices()
            .filter_map(|edge| {
                let (source, target) = self.graph.edge_endpoints(edge)?;
                Some(Edge {
                    source: self.graph.node_weight(source)?.clone(),
                    target: self.graph.node_weight(target)?.clone(),
                    kind: *self.graph.edge_weight(edge)?,
                })
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Removes every node and edge.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_map.clear();
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<Node, EdgeKind> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_typed_by_direction() {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.request("P2", "R1");

        assert_eq!(
            graph.edge_kind(&Node::resource("R1"), &Node::process("P1")),
            Some(EdgeKind::Allocation)
        );
        assert_eq!(
            graph.edge_kind(&Node::process("P2"), &Node::resource("R1")),
            Some(EdgeKind::Request)
        );
        assert_eq!(graph.edge_kind(&Node::process("P1"), &Node::resource("R1")), None);
    }

    #[test]
    fn test_same_pair_replaces_instead_of_duplicating() {
        let mut graph = AllocationGraph::new();
        graph.request("P1", "R1");
        graph.request("P1", "R1");

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_holder_and_requesters() {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.request("P2", "R1");
        graph.request("P3", "R1");

        assert_eq!(graph.holder_of("R1").as_deref(), Some("P1"));
        assert_eq!(graph.holder_of("R2"), None);

        let mut waiting = graph.requesters_of("R1");
        waiting.sort();
        assert_eq!(waiting, vec!["P2".to_string(), "P3".to_string()]);
    }

    #[test]
    fn test_process_and_resource_with_same_id_are_distinct() {
        let mut graph = AllocationGraph::new();
        graph.allocation("X", "X");

        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains(&Node::process("X")));
        assert!(graph.contains(&Node::resource("X")));
    }

    #[test]
    fn test_remove_if_isolated() {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");

        assert!(!graph.remove_if_isolated(&Node::process("P1")));

        graph.remove_edge(&Node::resource("R1"), &Node::process("P1"));
        assert_eq!(graph.degree(&Node::process("P1")), 0);
        assert!(graph.remove_if_isolated(&Node::process("P1")));
        assert!(graph.remove_if_isolated(&Node::resource("R1")));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_indices_survive_node_removal() {
        let mut graph = AllocationGraph::new();
        graph.allocation("R1", "P1");
        graph.allocation("R2", "P2");

        graph.remove_edge(&Node::resource("R1"), &Node::process("P1"));
        graph.remove_if_isolated(&Node::process("P1"));
        graph.remove_if_isolated(&Node::resource("R1"));

        assert_eq!(graph.holder_of("R2").as_deref(), Some("P2"));
        assert_eq!(graph.edges().len(), 1);
    }
}
