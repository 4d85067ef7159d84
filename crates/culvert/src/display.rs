//! Display kind resolution.
//!
//! Callers that overlay monitors on manholes without splicing dedicated
//! monitor nodes still expect those manholes to render as flow monitors.

use indexmap::IndexMap;

use culvert_core::{
    identifier::Id,
    network::{Monitor, Node, NodeKind},
};

use crate::splice::ClaimedManholes;

/// Returns the kind a node should be drawn as.
///
/// A manhole that carries a monitor is shown as a flow monitor, unless
/// splicing already claimed it for a dedicated monitor node.
pub fn resolve_kind(
    id: &Id,
    node: &Node,
    monitors: &IndexMap<Id, Monitor>,
    claimed: &ClaimedManholes,
) -> NodeKind {
    if node.kind().is_manhole() && monitors.contains_key(id) && !claimed.contains(id) {
        NodeKind::FlowMonitor
    } else {
        node.kind().clone()
    }
}

/// Resolves the display kind of every node, in node order.
pub fn display_kinds(
    nodes: &IndexMap<Id, Node>,
    monitors: &IndexMap<Id, Monitor>,
    claimed: &ClaimedManholes,
) -> IndexMap<Id, NodeKind> {
    nodes
        .iter()
        .map(|(id, node)| (id.clone(), resolve_kind(id, node, monitors, claimed)))
        .collect()
}
