//! Schematic layout.
//!
//! This module decides which placement algorithm lays out a network and
//! runs it. Two engines are available:
//!
//! - [`topological::Engine`]: fixed edge length, direction inherited from
//!   real-world coordinates. Used when most nodes carry coordinates.
//! - [`hierarchical::Engine`]: layered (Sugiyama) drawing with flow running
//!   left to right. Used when coordinates are missing.
//!
//! Both engines overwrite node positions in place.

pub mod hierarchical;
pub mod topological;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use culvert_core::{
    identifier::Id,
    network::{Conduit, Node},
};

use crate::{
    config::{LayoutConfig, LayoutEngine},
    graph::FlowGraph,
};

/// Share of nodes with real coordinates above which the topological engine
/// is chosen automatically.
const COORDINATE_COVERAGE_THRESHOLD: f64 = 0.5;

/// Interface shared by the placement engines.
pub trait PlacementEngine {
    /// Overwrites node positions with schematic coordinates.
    fn place(&self, nodes: &mut IndexMap<Id, Node>, conduits: &[Conduit]);
}

/// Which placement ran during [`layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutOutcome {
    Topological,
    Hierarchical,
    /// Nothing to lay out; coordinates were left as they were.
    Unchanged,
}

/// Returns the share of nodes with a non-zero position.
pub fn coordinate_coverage(nodes: &IndexMap<Id, Node>) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let placed = nodes
        .values()
        .filter(|node| !node.position().is_zero())
        .count();
    placed as f64 / nodes.len() as f64
}

/// Lays out `nodes` in place.
///
/// With [`LayoutEngine::Auto`] the topological engine runs when more than
/// half of the nodes carry non-zero coordinates, the hierarchical engine
/// runs when the graph has edges, and otherwise nothing changes.
pub fn layout(
    graph: &FlowGraph,
    nodes: &mut IndexMap<Id, Node>,
    conduits: &[Conduit],
    config: &LayoutConfig,
) -> LayoutOutcome {
    if nodes.is_empty() {
        debug!("No nodes to lay out");
        return LayoutOutcome::Unchanged;
    }

    let coverage = coordinate_coverage(nodes);
    let outcome = match config.engine() {
        LayoutEngine::Topological => LayoutOutcome::Topological,
        LayoutEngine::Hierarchical if graph.has_edges() => LayoutOutcome::Hierarchical,
        LayoutEngine::Hierarchical => LayoutOutcome::Unchanged,
        LayoutEngine::Auto if coverage > COORDINATE_COVERAGE_THRESHOLD => {
            LayoutOutcome::Topological
        }
        LayoutEngine::Auto if graph.has_edges() => LayoutOutcome::Hierarchical,
        LayoutEngine::Auto => LayoutOutcome::Unchanged,
    };

    info!(
        engine:? = config.engine(),
        coverage,
        outcome:?;
        "Selected layout"
    );

    match outcome {
        LayoutOutcome::Topological => {
            topological::Engine::new(config.edge_length())
                .with_root_spacing(config.root_spacing())
                .place(nodes, conduits);
        }
        LayoutOutcome::Hierarchical => {
            hierarchical::Engine::new(config.edge_length())
                .with_scale(config.hierarchical_scale())
                .place(nodes, conduits);
        }
        LayoutOutcome::Unchanged => {}
    }

    outcome
}

#[cfg(test)]
mod tests {
    use culvert_core::{
        geometry::Point,
        network::{ConduitKind, NodeKind},
    };

    use super::*;

    fn node(x: f64, y: f64) -> Node {
        Node::new(NodeKind::Manhole, Point::new(x, y))
    }

    fn conduit(id: &str, up: &str, down: &str) -> Conduit {
        Conduit::new(Id::new(id), Id::new(up), Id::new(down), ConduitKind::Conduit)
    }

    #[test]
    fn test_coordinate_coverage() {
        let nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(1.0, 0.0)),
            (Id::new("C"), node(0.0, 2.0)),
            (Id::new("D"), node(0.0, 0.0)),
        ]);

        assert_eq!(coordinate_coverage(&nodes), 0.5);
        assert_eq!(coordinate_coverage(&IndexMap::new()), 0.0);
    }

    #[test]
    fn test_auto_picks_topological_with_coordinates() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(10.0, 0.0)),
            (Id::new("C"), node(20.0, 0.0)),
        ]);
        let conduits = vec![conduit("1", "A", "B"), conduit("2", "B", "C")];
        let graph = FlowGraph::from_conduits(&conduits);

        let outcome = layout(&graph, &mut nodes, &conduits, &LayoutConfig::default());

        assert_eq!(outcome, LayoutOutcome::Topological);
    }

    #[test]
    fn test_exactly_half_coverage_is_not_topological() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(10.0, 0.0)),
        ]);
        let graph = FlowGraph::new();

        let outcome = layout(&graph, &mut nodes, &[], &LayoutConfig::default());

        assert_eq!(outcome, LayoutOutcome::Unchanged);
        assert_eq!(nodes["B"].position(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_auto_picks_hierarchical_without_coordinates() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(0.0, 0.0)),
        ]);
        let conduits = vec![conduit("1", "A", "B")];
        let graph = FlowGraph::from_conduits(&conduits);

        let outcome = layout(&graph, &mut nodes, &conduits, &LayoutConfig::default());

        assert_eq!(outcome, LayoutOutcome::Hierarchical);
    }

    #[test]
    fn test_forced_engine() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(0.0, 0.0)),
        ]);
        let conduits = vec![conduit("1", "A", "B")];
        let graph = FlowGraph::from_conduits(&conduits);
        let config = LayoutConfig::default().with_engine(LayoutEngine::Topological);

        let outcome = layout(&graph, &mut nodes, &conduits, &config);

        assert_eq!(outcome, LayoutOutcome::Topological);
        assert_eq!(nodes["B"].position(), Point::new(150.0, 0.0));
    }

    #[test]
    fn test_empty_nodes_unchanged() {
        let mut nodes = IndexMap::new();
        let outcome = layout(&FlowGraph::new(), &mut nodes, &[], &LayoutConfig::default());
        assert_eq!(outcome, LayoutOutcome::Unchanged);
    }
}
