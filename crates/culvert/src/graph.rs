//! Directed flow graph over node identifiers.
//!
//! This module provides [`FlowGraph`], the adjacency view built from a
//! conduit list. Compression walks it breadth-first, the topological layout
//! engine derives its parent and child lists from it, and the builder logs
//! its connectivity diagnostics.
//!
//! # Architecture
//!
//! - [`EdgeIndex`]: Index of an edge in insertion order
//! - [`Edge`]: Source, target and the originating conduit position
//! - [`FlowGraph`]: Node set plus incoming/outgoing edge indices per node
//!
//! The graph is a multigraph: parallel edges and self-loops are kept, since
//! filtering them is the job of the stages that care.

use std::collections::HashMap;

use indexmap::IndexSet;
use log::debug;
use petgraph::{algo, graphmap::DiGraphMap, unionfind::UnionFind};

use culvert_core::{identifier::Id, network::Conduit};

/// Index of an edge in a [`FlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(usize);

/// A directed edge of the flow graph.
#[derive(Debug, Clone)]
pub struct Edge {
    source: Id,
    target: Id,
    /// Position of the originating conduit in the input list.
    conduit: usize,
}

impl Edge {
    pub fn source(&self) -> &Id {
        &self.source
    }

    pub fn target(&self) -> &Id {
        &self.target
    }

    pub fn conduit(&self) -> usize {
        self.conduit
    }
}

/// Directed multigraph over node identifiers.
///
/// Nodes are stored in order of first appearance so iteration is
/// deterministic for a given conduit list.
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: IndexSet<Id>,
    edges: Vec<Edge>,
    incoming: HashMap<Id, Vec<EdgeIndex>>,
    outgoing: HashMap<Id, Vec<EdgeIndex>>,
}

impl FlowGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from a conduit list.
    ///
    /// Conduits with a blank upstream or downstream are skipped.
    pub fn from_conduits(conduits: &[Conduit]) -> Self {
        let mut graph = Self::new();
        for (position, conduit) in conduits.iter().enumerate() {
            if !conduit.has_endpoints() {
                debug!(conduit = conduit.id().as_str(); "Skipping conduit with blank endpoint");
                continue;
            }
            graph.add_edge(
                conduit.upstream().clone(),
                conduit.downstream().clone(),
                position,
            );
        }
        graph
    }

    /// Adds a directed edge, registering both endpoints as nodes.
    pub fn add_edge(&mut self, source: Id, target: Id, conduit: usize) -> EdgeIndex {
        self.nodes.insert(source.clone());
        self.nodes.insert(target.clone());

        let idx = EdgeIndex(self.edges.len());
        self.outgoing.entry(source.clone()).or_default().push(idx);
        self.incoming.entry(target.clone()).or_default().push(idx);
        self.edges.push(Edge {
            source,
            target,
            conduit,
        });
        idx
    }

    /// Returns an iterator over node identifiers in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &Id> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Returns an iterator over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Returns the indices of edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: &Id) -> &[EdgeIndex] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the indices of edges entering `id`, in insertion order.
    pub fn incoming(&self, id: &Id) -> &[EdgeIndex] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns an iterator over the targets of edges leaving `id`.
    pub fn successors<'a>(&'a self, id: &Id) -> impl Iterator<Item = &'a Id> {
        self.outgoing(id).iter().map(|idx| &self.edges[idx.0].target)
    }

    /// Returns an iterator over the sources of edges entering `id`.
    pub fn predecessors<'a>(&'a self, id: &Id) -> impl Iterator<Item = &'a Id> {
        self.incoming(id).iter().map(|idx| &self.edges[idx.0].source)
    }

    /// Computes connectivity diagnostics for logging.
    pub fn summary(&self) -> GraphSummary {
        let mut components = UnionFind::<usize>::new(self.node_count());
        let mut directed = DiGraphMap::<usize, ()>::new();

        for idx in 0..self.nodes.len() {
            directed.add_node(idx);
        }
        for edge in &self.edges {
            // Both endpoints were inserted by `add_edge`.
            let (Some(source), Some(target)) = (
                self.nodes.get_index_of(&edge.source),
                self.nodes.get_index_of(&edge.target),
            ) else {
                continue;
            };
            components.union(source, target);
            directed.add_edge(source, target, ());
        }

        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for label in components.into_labeling() {
            *sizes.entry(label).or_default() += 1;
        }

        GraphSummary {
            nodes: self.node_count(),
            edges: self.edge_count(),
            components: sizes.len(),
            largest_component: sizes.values().copied().max().unwrap_or(0),
            cyclic: algo::is_cyclic_directed(&directed),
        }
    }
}

/// Connectivity diagnostics of a [`FlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Number of weakly connected components.
    pub components: usize,
    /// Node count of the largest weakly connected component.
    pub largest_component: usize,
    /// Whether the directed graph contains a cycle (self-loops included).
    pub cyclic: bool,
}

#[cfg(test)]
mod tests {
    use culvert_core::network::ConduitKind;

    use super::*;

    fn conduit(id: &str, up: &str, down: &str) -> Conduit {
        Conduit::new(Id::new(id), Id::new(up), Id::new(down), ConduitKind::Conduit)
    }

    #[test]
    fn test_graph_new() {
        let graph = FlowGraph::new();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.has_edges());
        assert_eq!(graph.nodes().count(), 0);
    }

    #[test]
    fn test_from_conduits_skips_blank_endpoints() {
        let graph = FlowGraph::from_conduits(&[
            conduit("1", "A", "B"),
            conduit("2", " ", "C"),
            conduit("3", "B", ""),
        ]);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.nodes().any(|id| id == "C"));
    }

    #[test]
    fn test_edges_remember_conduit_position() {
        let graph = FlowGraph::from_conduits(&[conduit("1", "", "X"), conduit("2", "A", "B")]);

        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.conduit(), 1);
        assert_eq!(edge.source(), &Id::new("A"));
        assert_eq!(edge.target(), &Id::new("B"));
    }

    #[test]
    fn test_nodes_in_first_appearance_order() {
        let graph = FlowGraph::from_conduits(&[conduit("1", "Z", "A"), conduit("2", "A", "M")]);

        let nodes: Vec<&str> = graph.nodes().map(Id::as_str).collect();
        assert_eq!(nodes, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_successors_and_predecessors() {
        let graph = FlowGraph::from_conduits(&[
            conduit("1", "top", "left"),
            conduit("2", "top", "right"),
            conduit("3", "left", "bottom"),
            conduit("4", "right", "bottom"),
        ]);

        let top: Vec<&str> = graph.successors(&Id::new("top")).map(Id::as_str).collect();
        assert_eq!(top, vec!["left", "right"]);

        let bottom: Vec<&str> = graph
            .predecessors(&Id::new("bottom"))
            .map(Id::as_str)
            .collect();
        assert_eq!(bottom, vec!["left", "right"]);

        assert_eq!(graph.successors(&Id::new("bottom")).count(), 0);
        assert_eq!(graph.successors(&Id::new("missing")).count(), 0);
    }

    #[test]
    fn test_multiple_edges_and_self_loop_are_kept() {
        let graph = FlowGraph::from_conduits(&[
            conduit("1", "A", "B"),
            conduit("2", "A", "B"),
            conduit("3", "B", "B"),
        ]);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.outgoing(&Id::new("A")).len(), 2);
        // The self-loop makes B its own predecessor.
        let preds: Vec<&str> = graph.predecessors(&Id::new("B")).map(Id::as_str).collect();
        assert_eq!(preds, vec!["A", "A", "B"]);
    }

    #[test]
    fn test_summary_counts_weak_components() {
        let graph = FlowGraph::from_conduits(&[
            conduit("1", "A", "B"),
            conduit("2", "C", "B"),
            conduit("3", "X", "Y"),
        ]);

        let summary = graph.summary();
        assert_eq!(summary.nodes, 5);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.components, 2);
        assert_eq!(summary.largest_component, 3);
        assert!(!summary.cyclic);
    }

    #[test]
    fn test_summary_detects_cycle() {
        let graph = FlowGraph::from_conduits(&[
            conduit("1", "A", "B"),
            conduit("2", "B", "C"),
            conduit("3", "C", "A"),
        ]);

        let summary = graph.summary();
        assert_eq!(summary.components, 1);
        assert!(summary.cyclic);
    }
}
