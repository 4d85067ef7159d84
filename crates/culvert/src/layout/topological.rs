//! Fixed edge length topological layout
//!
//! Nodes are placed in topological order. Every edge gets the same logical
//! length, but its direction is taken from the real-world positions of its
//! endpoints, so the schematic follows the true flow direction without
//! inheriting real pipe lengths. A node with several parents is placed at the
//! centroid of the positions its parents suggest. Nodes that cannot be
//! reached from a root (cycles, or islands hanging off one) are lined up in a
//! row below everything else.

use std::collections::{HashMap, VecDeque};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use culvert_core::{
    geometry::Point,
    identifier::Id,
    network::{Conduit, Node},
};

use super::PlacementEngine;
use crate::graph::FlowGraph;

/// Direction used when both endpoints share a world position.
const FALLBACK_DIRECTION: Point = Point::new(1.0, 0.0);

/// The topological layout engine
pub struct Engine {
    /// Logical length of every edge
    edge_length: f64,

    /// Gap between root seeds, in multiples of the edge length
    root_spacing: f64,
}

impl Engine {
    /// Create a new engine with the given edge length
    pub fn new(edge_length: f64) -> Self {
        Self {
            edge_length,
            root_spacing: 2.5,
        }
    }

    /// Set the gap between root seeds, in multiples of the edge length
    pub fn with_root_spacing(mut self, root_spacing: f64) -> Self {
        self.root_spacing = root_spacing;
        self
    }

    /// Compute placements keyed by node id.
    pub fn positions(
        &self,
        nodes: &IndexMap<Id, Node>,
        conduits: &[Conduit],
    ) -> IndexMap<Id, Point> {
        let graph = FlowGraph::from_conduits(conduits);
        let adjacency = Adjacency::new(nodes, &graph);

        let mut remaining: HashMap<&Id, usize> = nodes
            .keys()
            .map(|id| (id, adjacency.parents(id).len()))
            .collect();

        let mut roots: Vec<&Id> = nodes
            .keys()
            .filter(|id| adjacency.parents(id).is_empty())
            .collect();
        roots.sort();

        let mut suggestions: HashMap<&Id, Vec<Point>> = HashMap::new();
        for (i, &root) in roots.iter().enumerate() {
            let x = i as f64 * self.edge_length * self.root_spacing;
            suggestions.entry(root).or_default().push(Point::new(x, 0.0));
        }

        let mut placed: IndexMap<Id, Point> = IndexMap::with_capacity(nodes.len());
        let mut queue: VecDeque<&Id> = roots.into_iter().collect();
        // A node is queued once its last parent is placed. The budget bounds
        // the re-queue path.
        let mut budget = nodes.len().saturating_mul(nodes.len()).max(16);

        while let Some(current) = queue.pop_front() {
            if budget == 0 {
                debug!("Topological placement budget exhausted");
                break;
            }
            budget -= 1;

            if adjacency
                .parents(current)
                .iter()
                .any(|parent| !placed.contains_key(*parent))
            {
                queue.push_back(current);
                continue;
            }

            let position = suggestions
                .get(current)
                .and_then(|points| Point::centroid(points.iter().copied()))
                .unwrap_or_default();
            placed.insert(current.clone(), position);
            trace!(node = current.as_str(), x = position.x(), y = position.y(); "Placed node");

            let origin = nodes[current].position();
            for child in adjacency.children(current) {
                suggestions.entry(child).or_default().push(self.suggest(
                    position,
                    origin,
                    nodes[child].position(),
                ));

                if let Some(count) = remaining.get_mut(child) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        self.place_unreached(nodes, &mut placed);
        placed
    }

    /// Suggests a child position one edge length away from its placed
    /// parent, along the world bearing from `from` to `to`.
    fn suggest(&self, placed_parent: Point, from: Point, to: Point) -> Point {
        let direction = to.sub_point(from).unit().unwrap_or(FALLBACK_DIRECTION);
        placed_parent.add_point(direction.scale(self.edge_length))
    }

    /// Lines up nodes never reached from a root in a row below the layout.
    fn place_unreached(&self, nodes: &IndexMap<Id, Node>, placed: &mut IndexMap<Id, Point>) {
        let mut unreached: Vec<&Id> = nodes
            .keys()
            .filter(|id| !placed.contains_key(*id))
            .collect();
        if unreached.is_empty() {
            return;
        }
        unreached.sort();

        let row_y = placed
            .values()
            .map(|point| point.y())
            .reduce(f64::max)
            .map_or(0.0, |max_y| max_y + self.edge_length);

        debug!(count = unreached.len(), row_y; "Placing nodes unreachable from any root");
        for (i, id) in unreached.into_iter().enumerate() {
            placed.insert(id.clone(), Point::new(i as f64 * self.edge_length, row_y));
        }
    }
}

impl PlacementEngine for Engine {
    fn place(&self, nodes: &mut IndexMap<Id, Node>, conduits: &[Conduit]) {
        let positions = self.positions(nodes, conduits);
        for (id, node) in nodes.iter_mut() {
            if let Some(&position) = positions.get(id) {
                node.set_position(position);
            }
        }
    }
}

/// Deduplicated parent/child lists over known nodes, without self-loops.
struct Adjacency<'a> {
    children: HashMap<&'a Id, IndexSet<&'a Id>>,
    parents: HashMap<&'a Id, IndexSet<&'a Id>>,
}

impl<'a> Adjacency<'a> {
    fn new(nodes: &'a IndexMap<Id, Node>, graph: &'a FlowGraph) -> Self {
        let known = |id: &&'a Id, of: &Id| *id != of && nodes.contains_key(*id);
        let mut children = HashMap::new();
        let mut parents = HashMap::new();

        for id in nodes.keys() {
            let downstream: IndexSet<&Id> =
                graph.successors(id).filter(|child| known(child, id)).collect();
            let upstream: IndexSet<&Id> =
                graph.predecessors(id).filter(|parent| known(parent, id)).collect();
            if !downstream.is_empty() {
                children.insert(id, downstream);
            }
            if !upstream.is_empty() {
                parents.insert(id, upstream);
            }
        }

        Self { children, parents }
    }

    fn children(&self, id: &Id) -> Vec<&'a Id> {
        self.children
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn parents(&self, id: &Id) -> Vec<&'a Id> {
        self.parents
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
