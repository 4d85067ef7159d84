//! Hierarchical layout engine.
//!
//! Layered drawing of the flow graph for networks without usable
//! coordinates. Layers run along x so flow reads left to right; nodes
//! sharing a layer are spread along y.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use rust_sugiyama::configure::Config;

use culvert_core::{
    geometry::Point,
    identifier::Id,
    network::{Conduit, Node},
};

use super::PlacementEngine;
use crate::error::CulvertError;

/// The Sugiyama layout engine
/// Based on the Sugiyama algorithm for layered drawing of directed graphs
pub struct Engine {
    /// Distance between adjacent layers and between neighbours in a layer
    edge_length: f64,

    /// Final stretch applied after normalising to the origin
    scale: f64,

    /// Vertex spacing handed to rust-sugiyama; raw coordinates are divided
    /// by it to recover slot numbers.
    vertex_spacing: f64,
}

impl Engine {
    /// Create a new hierarchical engine with the given edge length
    pub fn new(edge_length: f64) -> Self {
        Self {
            edge_length,
            scale: 1.5,
            vertex_spacing: 3.0,
        }
    }

    /// Set the final scale factor
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Calculate positions for every node that takes part in an edge.
    ///
    /// Nodes without edges are absent from the result.
    pub fn positions(
        &self,
        nodes: &IndexMap<Id, Node>,
        conduits: &[Conduit],
    ) -> Result<HashMap<Id, Point>, CulvertError> {
        // Sequential ids in sorted order keep the result stable across
        // input orderings.
        let mut ids: Vec<&Id> = nodes.keys().collect();
        ids.sort();
        let node_ids: HashMap<&Id, u32> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i as u32))
            .collect();

        let mut edges: IndexSet<(u32, u32)> = IndexSet::new();
        for conduit in conduits {
            let (upstream, downstream) = conduit.endpoints();
            if let (Some(&source), Some(&target)) =
                (node_ids.get(upstream), node_ids.get(downstream))
            {
                // Skip self-loops
                if source != target {
                    edges.insert((source, target));
                }
            }
        }

        if edges.is_empty() {
            debug!("Graph has no edges. Nothing to place hierarchically.");
            return Ok(HashMap::new());
        }

        debug!(nodes = node_ids.len(), edges = edges.len(); "Applying Sugiyama algorithm");

        let edges: Vec<(u32, u32)> = edges.into_iter().collect();
        let vertex_spacing = self.vertex_spacing;
        let layouts = std::panic::catch_unwind(move || {
            let config = Config {
                minimum_length: 1,
                vertex_spacing,
                ..Default::default()
            };
            rust_sugiyama::from_edges(&edges, &config)
        })
        .map_err(|err| {
            let message = if let Some(panic_msg) = err.downcast_ref::<String>() {
                format!("Rust-sugiyama layout engine panicked: {panic_msg}")
            } else if let Some(panic_msg) = err.downcast_ref::<&str>() {
                format!("Rust-sugiyama layout engine panicked: {panic_msg}")
            } else {
                "Rust-sugiyama layout engine panicked with unknown error".to_string()
            };
            CulvertError::Layout(message)
        })?;

        if layouts.is_empty() {
            return Err(CulvertError::Layout(
                "Rust-sugiyama returned empty layout results".to_string(),
            ));
        }

        // (slot within layer, layer) per node, with components stacked
        // side by side along the slot axis.
        let mut grid: HashMap<Id, (f64, f64)> = HashMap::new();
        let mut slot_offset = 0.0;
        for (coords, _, _) in &layouts {
            let Some(min_slot) = coords
                .iter()
                .map(|&(_, (x, _))| x / vertex_spacing)
                .reduce(f64::min)
            else {
                continue;
            };

            let mut max_slot = 0.0_f64;
            for &(id, (x, y)) in coords {
                let Some(&node_id) = ids.get(id) else {
                    debug!(id; "Node ID from rust-sugiyama result is out of valid range");
                    continue;
                };
                let slot = x / vertex_spacing - min_slot;
                max_slot = max_slot.max(slot);
                grid.insert(node_id.clone(), (slot + slot_offset, y / vertex_spacing));
            }
            slot_offset += max_slot + 1.0;
        }

        if grid.is_empty() {
            return Err(CulvertError::Layout(
                "Failed to map any rust-sugiyama positions back to graph nodes".to_string(),
            ));
        }

        let mut positions: HashMap<Id, Point> = grid
            .into_iter()
            .map(|(id, (slot, layer))| {
                (
                    id,
                    Point::new(layer * self.edge_length, slot * self.edge_length),
                )
            })
            .collect();

        self.orient_left_to_right(&mut positions, conduits);
        self.normalize(&mut positions);

        debug!(positioned = positions.len(); "Hierarchical layout generated");
        Ok(positions)
    }

    /// Mirrors x when most edges point towards -x.
    fn orient_left_to_right(&self, positions: &mut HashMap<Id, Point>, conduits: &[Conduit]) {
        let mut balance = 0_i64;
        for conduit in conduits {
            let (Some(source), Some(target)) = (
                positions.get(conduit.upstream()),
                positions.get(conduit.downstream()),
            ) else {
                continue;
            };
            if target.x() > source.x() {
                balance += 1;
            } else if target.x() < source.x() {
                balance -= 1;
            }
        }

        if balance < 0 {
            for position in positions.values_mut() {
                *position = position.with_x(-position.x());
            }
        }
    }

    /// Translates the minimum corner to the origin and applies the scale.
    fn normalize(&self, positions: &mut HashMap<Id, Point>) {
        let Some(min) = positions
            .values()
            .copied()
            .reduce(|a, b| Point::new(a.x().min(b.x()), a.y().min(b.y())))
        else {
            return;
        };

        for position in positions.values_mut() {
            *position = position.sub_point(min).scale(self.scale);
        }
    }
}

impl PlacementEngine for Engine {
    fn place(&self, nodes: &mut IndexMap<Id, Node>, conduits: &[Conduit]) {
        match self.positions(nodes, conduits) {
            Ok(positions) => {
                for (id, node) in nodes.iter_mut() {
                    if let Some(&position) = positions.get(id) {
                        node.set_position(position);
                    }
                }
            }
            Err(err) => {
                warn!(err:%; "Hierarchical layout failed, keeping input coordinates");
            }
        }
    }
}
