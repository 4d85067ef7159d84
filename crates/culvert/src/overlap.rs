//! Overlap resolution.
//!
//! A relaxation solver that pushes node pairs apart until every pair is at
//! least the minimum separation apart, or the iteration cap is reached.
//! Callers must tolerate residual overlap when the cap is hit.

use std::f64::consts::TAU;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;

use culvert_core::{geometry::Point, identifier::Id, network::Node};

use crate::config::OverlapConfig;

/// Pairs closer than this are treated as coincident.
const COINCIDENT_DISTANCE: f64 = 1e-6;

/// Slack below the minimum separation that still counts as separated.
const SEPARATION_TOLERANCE: f64 = 1e-9;

/// Outcome of an overlap resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapReport {
    /// Number of passes performed
    pub iterations: usize,
    /// Whether the last pass found no overlapping pair
    pub converged: bool,
}

/// Separates nodes closer than `config.min_separation()`, in place.
///
/// Nodes are visited in ascending id order. Coincident pairs are fanned
/// out along the angle `2π·j/n`, where `j` is the position of the pair's
/// second node in that order and `n` the node count.
pub fn resolve(nodes: &mut IndexMap<Id, Node>, config: &OverlapConfig) -> OverlapReport {
    if !config.enabled() {
        debug!("Overlap resolution disabled");
        return OverlapReport {
            iterations: 0,
            converged: true,
        };
    }

    let mut ids: Vec<Id> = nodes.keys().cloned().collect();
    ids.sort();
    let mut positions: Vec<Point> = ids.iter().map(|id| nodes[id].position()).collect();

    let report = relax(
        &mut positions,
        config.min_separation(),
        config.max_iterations(),
    );

    for (id, position) in ids.iter().zip(positions) {
        if let Some(node) = nodes.get_mut(id) {
            node.set_position(position);
        }
    }

    if report.converged {
        info!(nodes = ids.len(), iterations = report.iterations; "Resolved overlaps");
    } else {
        warn!(
            nodes = ids.len(),
            iterations = report.iterations;
            "Overlap resolution hit the iteration cap; some nodes may still overlap"
        );
    }
    report
}

/// Runs the pairwise relaxation over `positions`.
fn relax(positions: &mut [Point], min_separation: f64, max_iterations: usize) -> OverlapReport {
    let n = positions.len();
    let threshold = min_separation - SEPARATION_TOLERANCE;

    for iteration in 1..=max_iterations {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[j].sub_point(positions[i]);
                let distance = delta.hypot();
                if distance >= threshold {
                    continue;
                }

                let direction = if distance < COINCIDENT_DISTANCE {
                    let angle = TAU * j as f64 / n as f64;
                    Point::new(angle.cos(), angle.sin())
                } else {
                    delta.scale(1.0 / distance)
                };
                let push = direction.scale((min_separation - distance) / 2.0);
                positions[i] = positions[i].sub_point(push);
                positions[j] = positions[j].add_point(push);
                moved = true;
            }
        }

        if !moved {
            return OverlapReport {
                iterations: iteration,
                converged: true,
            };
        }
    }

    OverlapReport {
        iterations: max_iterations,
        converged: !has_overlap(positions, threshold),
    }
}

fn has_overlap(positions: &[Point], threshold: f64) -> bool {
    positions.iter().enumerate().any(|(i, first)| {
        positions[i + 1..]
            .iter()
            .any(|second| first.distance(*second) < threshold)
    })
}
