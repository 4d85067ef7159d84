//! Topology compression.
//!
//! Collapses chains of plain manholes so that the schematic only shows the
//! nodes someone cares about. A node is *important* if it carries a monitor
//! or if its kind is anything other than a manhole. Every important node is
//! connected to the important nodes it drains into, with the manholes in
//! between treated as transparent hops.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, info};

use culvert_core::{
    identifier::Id,
    network::{Conduit, ConduitKind, Monitor, Node},
};

use crate::graph::FlowGraph;

/// Result of [`compress`].
#[derive(Debug, Clone)]
pub struct Compressed {
    pub conduits: Vec<Conduit>,
    pub nodes: IndexMap<Id, Node>,
}

/// Collapses manhole chains between important nodes.
///
/// Important nodes are expanded in ascending id order and each walk follows
/// outgoing edges in conduit order, so the first-wins choice between
/// competing paths is deterministic. A compressed edge `(s, t)` reuses the
/// identity, type and colour of a direct conduit from `s` to `t` when one
/// exists; otherwise it gets a synthesized `"{s}_to_{t}"` id and the plain
/// conduit type.
///
/// Only nodes that end up on a compressed edge are kept, so an important
/// node with no path to or from another important node is dropped.
pub fn compress(
    conduits: &[Conduit],
    nodes: &IndexMap<Id, Node>,
    monitors: &IndexMap<Id, Monitor>,
) -> Compressed {
    let graph = FlowGraph::from_conduits(conduits);
    let is_important = |id: &Id| {
        monitors.contains_key(id) || nodes.get(id).is_some_and(|node| !node.kind().is_manhole())
    };

    let mut direct: HashMap<(&Id, &Id), &Conduit> = HashMap::new();
    for edge in graph.edges() {
        direct
            .entry((edge.source(), edge.target()))
            .or_insert(&conduits[edge.conduit()]);
    }

    let mut important: Vec<&Id> = graph.nodes().filter(|&id| is_important(id)).collect();
    important.sort();

    let mut emitted: HashSet<(&Id, &Id)> = HashSet::new();
    let mut compressed = Vec::new();

    for &start in &important {
        let mut visited: HashSet<&Id> = HashSet::from([start]);
        let mut queue: VecDeque<&Id> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in graph.successors(current) {
                if next == start {
                    continue;
                }
                if is_important(next) {
                    if emitted.insert((start, next)) {
                        compressed.push(compressed_conduit(start, next, &direct));
                    }
                    continue;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    let before = compressed.len();
    compressed.retain(|conduit: &Conduit| {
        let resolved =
            nodes.contains_key(conduit.upstream()) && nodes.contains_key(conduit.downstream());
        if !resolved {
            debug!(conduit = conduit.id().as_str(); "Dropping compressed conduit to unknown node");
        }
        resolved
    });

    let endpoints: HashSet<&Id> = compressed
        .iter()
        .flat_map(|conduit| [conduit.upstream(), conduit.downstream()])
        .collect();
    let kept_nodes: IndexMap<Id, Node> = nodes
        .iter()
        .filter(|(id, _)| endpoints.contains(id))
        .map(|(id, node)| (id.clone(), node.clone()))
        .collect();

    info!(
        nodes_before = nodes.len(),
        nodes_after = kept_nodes.len(),
        conduits_before = conduits.len(),
        conduits_after = compressed.len(),
        unresolved = before - compressed.len();
        "Network compressed"
    );

    Compressed {
        conduits: compressed,
        nodes: kept_nodes,
    }
}

fn compressed_conduit(source: &Id, target: &Id, direct: &HashMap<(&Id, &Id), &Conduit>) -> Conduit {
    match direct.get(&(source, target)) {
        Some(&original) => original.clone(),
        None => Conduit::new(
            Id::connecting(source, target),
            source.clone(),
            target.clone(),
            ConduitKind::Conduit,
        ),
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;

    use culvert_core::{geometry::Point, network::NodeKind};
    use proptest::prelude::*;

    use super::*;

    fn network_strategy() -> impl Strategy<Value = (Vec<Conduit>, IndexMap<Id, Node>, IndexMap<Id, Monitor>)>
    {
        let kinds = prop::collection::vec(0u8..4, 2..12);
        kinds.prop_flat_map(|kinds| {
            let count = kinds.len();
            let edges = prop::collection::vec((0..count, 0..count), 0..30);
            let monitored = prop::collection::vec(any::<bool>(), count);
            (Just(kinds), edges, monitored)
        })
        .prop_map(|(kinds, edges, monitored)| {
            let nodes: IndexMap<Id, Node> = kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| {
                    let kind = match kind {
                        0 | 1 => NodeKind::Manhole,
                        2 => NodeKind::Outfall,
                        _ => NodeKind::Weir,
                    };
                    (Id::new(&format!("n{i}")), Node::new(kind, Point::default()))
                })
                .collect();
            let conduits = edges
                .iter()
                .enumerate()
                .map(|(i, (up, down))| {
                    Conduit::new(
                        Id::new(&format!("c{i}")),
                        Id::new(&format!("n{up}")),
                        Id::new(&format!("n{down}")),
                        ConduitKind::Conduit,
                    )
                })
                .collect();
            let monitors = monitored
                .iter()
                .enumerate()
                .filter(|(_, monitored)| **monitored)
                .map(|(i, _)| (Id::new(&format!("n{i}")), Monitor::default()))
                .collect();
            (conduits, nodes, monitors)
        })
    }

    /// Compression never grows the network and never emits a self-loop or
    /// a repeated pair.
    fn check_compression_invariants(
        conduits: Vec<Conduit>,
        nodes: IndexMap<Id, Node>,
        monitors: IndexMap<Id, Monitor>,
    ) -> Result<(), TestCaseError> {
        let result = compress(&conduits, &nodes, &monitors);

        prop_assert!(result.nodes.len() <= nodes.len());

        // Fewer conduits is only guaranteed while no manhole fans out: a
        // manhole hub joining several important sources to several
        // important sinks yields one compressed edge per source/sink pair.
        let graph = FlowGraph::from_conduits(&conduits);
        let fans_out = graph.nodes().any(|id| {
            let important = monitors.contains_key(id)
                || nodes.get(id).is_some_and(|node| !node.kind().is_manhole());
            !important && graph.successors(id).collect::<HashSet<_>>().len() > 1
        });
        if !fans_out {
            prop_assert!(result.conduits.len() <= conduits.len());
        }

        let mut pairs = HashSet::new();
        for conduit in &result.conduits {
            prop_assert!(!conduit.is_self_loop());
            prop_assert!(pairs.insert(conduit.endpoints()));
            prop_assert!(result.nodes.contains_key(conduit.upstream()));
            prop_assert!(result.nodes.contains_key(conduit.downstream()));
        }

        for (id, node) in &result.nodes {
            prop_assert!(monitors.contains_key(id) || !node.kind().is_manhole());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn compression_invariants((conduits, nodes, monitors) in network_strategy()) {
            check_compression_invariants(conduits, nodes, monitors)?;
        }
    }
}
