//! Segment flattening.
//!
//! Conduits that are almost horizontal or almost vertical are snapped onto a
//! shared axis so the schematic reads as straight runs. Near-horizontal
//! conduits are grouped transitively over their endpoints and every group
//! shares the mean y of its members; near-vertical conduits do the same for
//! x. Passes repeat until nothing moves or the pass cap is reached.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, info};
use petgraph::unionfind::UnionFind;

use culvert_core::{
    identifier::Id,
    network::{Conduit, Node},
};

use crate::config::FlattenConfig;

/// Segments shorter than this have no meaningful direction.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Groups whose coordinates differ by no more than this are already aligned.
const ALIGNED_SPREAD: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Near-horizontal segments, aligned on a shared y.
    Horizontal,
    /// Near-vertical segments, aligned on a shared x.
    Vertical,
}

/// Snaps near-axis conduits onto shared axes, in place.
///
/// Returns the number of passes that moved at least one node. A result
/// below `config.max_passes()` means a fixed point was reached.
pub fn flatten(
    nodes: &mut IndexMap<Id, Node>,
    conduits: &[Conduit],
    config: &FlattenConfig,
) -> usize {
    if !config.enabled() {
        debug!("Segment flattening disabled");
        return 0;
    }

    let segments = segments(nodes, conduits);
    if segments.is_empty() {
        return 0;
    }

    let sin_threshold = config.angle_threshold_deg().to_radians().sin();
    let mut changed_passes = 0;
    for pass in 1..=config.max_passes() {
        let horizontal = snap_axis(nodes, &segments, Axis::Horizontal, sin_threshold);
        let vertical = snap_axis(nodes, &segments, Axis::Vertical, sin_threshold);
        if !horizontal && !vertical {
            debug!(pass; "Flattening reached a fixed point");
            break;
        }
        changed_passes += 1;
    }

    info!(
        segments = segments.len(),
        passes = changed_passes;
        "Flattened segments"
    );
    changed_passes
}

/// Resolves conduits to pairs of node indices, skipping self-loops and
/// conduits with unknown endpoints.
fn segments(nodes: &IndexMap<Id, Node>, conduits: &[Conduit]) -> Vec<(usize, usize)> {
    conduits
        .iter()
        .filter(|conduit| !conduit.is_self_loop())
        .filter_map(|conduit| {
            let (upstream, downstream) = conduit.endpoints();
            Some((
                nodes.get_index_of(upstream)?,
                nodes.get_index_of(downstream)?,
            ))
        })
        .collect()
}

/// Runs one grouping-and-snapping step along `axis`. Returns whether any
/// node moved.
fn snap_axis(
    nodes: &mut IndexMap<Id, Node>,
    segments: &[(usize, usize)],
    axis: Axis,
    sin_threshold: f64,
) -> bool {
    let mut groups = UnionFind::<usize>::new(nodes.len());
    let mut members = vec![false; nodes.len()];

    for &(a, b) in segments {
        let delta = nodes[b].position().sub_point(nodes[a].position());
        let length = delta.hypot();
        if length < MIN_SEGMENT_LENGTH {
            continue;
        }
        let off_axis = match axis {
            Axis::Horizontal => delta.y().abs(),
            Axis::Vertical => delta.x().abs(),
        };
        if off_axis / length < sin_threshold {
            groups.union(a, b);
            members[a] = true;
            members[b] = true;
        }
    }

    let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, _) in members.iter().enumerate().filter(|(_, member)| **member) {
        grouped.entry(groups.find(index)).or_default().push(index);
    }

    let coordinate = |node: &Node| match axis {
        Axis::Horizontal => node.position().y(),
        Axis::Vertical => node.position().x(),
    };

    let mut moved = false;
    for group in grouped.values() {
        let values: Vec<f64> = group.iter().map(|&index| coordinate(&nodes[index])).collect();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
                (min.min(value), max.max(value))
            });
        if max - min <= ALIGNED_SPREAD {
            continue;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        for &index in group {
            let node = &mut nodes[index];
            let position = match axis {
                Axis::Horizontal => node.position().with_y(mean),
                Axis::Vertical => node.position().with_x(mean),
            };
            node.set_position(position);
        }
        moved = true;
    }

    moved
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

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
    fn test_single_edge_snaps_to_average() {
        let mut nodes = IndexMap::from([(Id::new("A"), node(0.0, 0.0)), (Id::new("B"), node(100.0, 10.0))]);
        let conduits = vec![conduit("1", "A", "B")];

        let passes = flatten(&mut nodes, &conduits, &FlattenConfig::default());

        assert_eq!(passes, 1);
        assert_eq!(nodes["A"].position(), Point::new(0.0, 5.0));
        assert_eq!(nodes["B"].position(), Point::new(100.0, 5.0));
    }

    #[test]
    fn test_vertical_edge_snaps_x() {
        let mut nodes = IndexMap::from([(Id::new("A"), node(0.0, 0.0)), (Id::new("B"), node(6.0, 100.0))]);
        let conduits = vec![conduit("1", "A", "B")];

        flatten(&mut nodes, &conduits, &FlattenConfig::default());

        assert_eq!(nodes["A"].position(), Point::new(3.0, 0.0));
        assert_eq!(nodes["B"].position(), Point::new(3.0, 100.0));
    }

    #[test]
    fn test_chain_shares_one_axis() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(100.0, 10.0)),
            (Id::new("C"), node(200.0, -4.0)),
        ]);
        let conduits = vec![conduit("1", "A", "B"), conduit("2", "B", "C")];

        let passes = flatten(&mut nodes, &conduits, &FlattenConfig::default());

        assert!(passes <= 2);
        let y = nodes["A"].position().y();
        assert_approx_eq!(f64, y, 2.0);
        assert_eq!(nodes["B"].position().y(), y);
        assert_eq!(nodes["C"].position().y(), y);
    }

    #[test]
    fn test_diagonal_is_untouched() {
        let mut nodes = IndexMap::from([(Id::new("A"), node(0.0, 0.0)), (Id::new("B"), node(100.0, 100.0))]);
        let conduits = vec![conduit("1", "A", "B")];

        let passes = flatten(&mut nodes, &conduits, &FlattenConfig::default());

        assert_eq!(passes, 0);
        assert_eq!(nodes["B"].position(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_threshold_boundary() {
        // 20 degrees off horizontal is outside the default 15 degree window.
        let angle = 20f64.to_radians();
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(100.0 * angle.cos(), 100.0 * angle.sin())),
        ]);
        let conduits = vec![conduit("1", "A", "B")];

        assert_eq!(flatten(&mut nodes, &conduits, &FlattenConfig::default()), 0);
    }

    #[test]
    fn test_zero_length_and_self_loop_ignored() {
        let mut nodes = IndexMap::from([(Id::new("A"), node(5.0, 5.0)), (Id::new("B"), node(5.0, 5.0))]);
        let conduits = vec![conduit("1", "A", "B"), conduit("2", "A", "A")];

        assert_eq!(flatten(&mut nodes, &conduits, &FlattenConfig::default()), 0);
    }

    #[test]
    fn test_disabled_does_nothing() {
        let mut nodes = IndexMap::from([(Id::new("A"), node(0.0, 0.0)), (Id::new("B"), node(100.0, 10.0))]);
        let conduits = vec![conduit("1", "A", "B")];
        let config = FlattenConfig::default().with_enabled(false);

        assert_eq!(flatten(&mut nodes, &conduits, &config), 0);
        assert_eq!(nodes["B"].position(), Point::new(100.0, 10.0));
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut nodes = IndexMap::from([
            (Id::new("A"), node(0.0, 0.0)),
            (Id::new("B"), node(100.0, 10.0)),
            (Id::new("C"), node(105.0, 110.0)),
        ]);
        let conduits = vec![conduit("1", "A", "B"), conduit("2", "B", "C")];
        let config = FlattenConfig::default();

        flatten(&mut nodes, &conduits, &config);
        let before = nodes.clone();
        let passes = flatten(&mut nodes, &conduits, &config);

        assert_eq!(passes, 0);
        for (id, node) in &before {
            assert_eq!(nodes[id].position(), node.position());
        }
    }

    proptest! {
        #[test]
        fn prop_flatten_is_idempotent(
            coords in prop::collection::vec((-500.0..500.0f64, -500.0..500.0f64), 2..12),
            links in prop::collection::vec((0usize..12, 0usize..12), 0..16),
        ) {
            let mut nodes: IndexMap<Id, Node> = coords
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| (Id::new(&format!("N{i}")), node(x, y)))
                .collect();
            let conduits: Vec<Conduit> = links
                .iter()
                .enumerate()
                .map(|(i, &(a, b))| {
                    let a = a % coords.len();
                    let b = b % coords.len();
                    conduit(&format!("C{i}"), &format!("N{a}"), &format!("N{b}"))
                })
                .collect();
            let config = FlattenConfig::default();

            let first = flatten(&mut nodes, &conduits, &config);
            prop_assume!(first < config.max_passes());

            let before = nodes.clone();
            prop_assert_eq!(flatten(&mut nodes, &conduits, &config), 0);
            for (id, node) in &before {
                prop_assert_eq!(nodes[id].position(), node.position());
            }
        }
    }
}
