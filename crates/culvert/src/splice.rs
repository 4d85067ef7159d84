//! Monitor splicing.
//!
//! Rewrites the node and conduit sets so that every configured monitor is a
//! node of its own. Two strategies are supported, selected by
//! [`SpliceStrategy`]:
//!
//! - [`SpliceStrategy::Substitute`]: the configured manhole is replaced by the
//!   monitor node, and every conduit touching the manhole is rewired to the
//!   monitor. A manhole with several inflows becomes a monitor with several
//!   inflows.
//! - [`SpliceStrategy::SplitConduit`]: the conduit named by the monitor's
//!   `link` is removed and replaced by two conduits running through a new
//!   monitor node at its midpoint. The manhole itself is left untouched.
//!
//! Either way the manholes that received a monitor are reported as
//! [`ClaimedManholes`], which display-type resolution consults later.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use log::{debug, info};

use culvert_core::{
    identifier::Id,
    network::{Conduit, MonitorInfo, Node, NodeKind},
};

use crate::config::SpliceStrategy;

/// Manhole identifiers that received a dedicated monitor node.
pub type ClaimedManholes = BTreeSet<Id>;

/// Splices monitor nodes into the network.
///
/// Entries are applied in ascending manhole-id order. Entries that name a
/// manhole, or for [`SpliceStrategy::SplitConduit`] a conduit, that does not
/// exist are skipped. When `monitor_info` is empty the network is left
/// exactly as it is.
pub fn splice(
    nodes: &mut IndexMap<Id, Node>,
    conduits: &mut Vec<Conduit>,
    monitor_info: &IndexMap<Id, MonitorInfo>,
    strategy: SpliceStrategy,
) -> ClaimedManholes {
    if monitor_info.is_empty() {
        return ClaimedManholes::new();
    }

    let mut entries: Vec<(&Id, &MonitorInfo)> = monitor_info.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let claimed = match strategy {
        SpliceStrategy::Substitute => substitute(nodes, conduits, &entries),
        SpliceStrategy::SplitConduit => split_conduits(nodes, conduits, &entries),
    };

    let before = conduits.len();
    retain_unique_links(conduits);
    info!(
        strategy:?,
        claimed = claimed.len(),
        dropped_conduits = before - conduits.len();
        "Monitors spliced"
    );

    claimed
}

/// Replaces each configured manhole by its monitor node.
///
/// Conduits are rewired after every entry, so a monitor named after a
/// manhole that is itself substituted later ends up at the final monitor.
fn substitute(
    nodes: &mut IndexMap<Id, Node>,
    conduits: &mut [Conduit],
    entries: &[(&Id, &MonitorInfo)],
) -> ClaimedManholes {
    let mut claimed = ClaimedManholes::new();

    for &(manhole_id, info) in entries {
        let monitor_id = info.monitor_name();
        if monitor_id.is_blank() {
            debug!(manhole = manhole_id.as_str(); "Skipping monitor entry without a monitor name");
            continue;
        }
        let Some((index, _, manhole)) = nodes.shift_remove_full(manhole_id) else {
            debug!(manhole = manhole_id.as_str(); "Skipping monitor entry for unknown manhole");
            continue;
        };

        let tooltip = monitor_tooltip(monitor_id, manhole_id, info, None);
        match nodes.get_mut(monitor_id) {
            Some(existing) => {
                debug!(
                    manhole = manhole_id.as_str(),
                    monitor = monitor_id.as_str();
                    "Monitor node already exists, merging manhole into it"
                );
                existing.set_kind(NodeKind::FlowMonitor);
            }
            None => {
                let monitor =
                    Node::new(NodeKind::FlowMonitor, manhole.position()).with_tooltip(tooltip);
                let index = index.min(nodes.len());
                nodes.shift_insert(index, monitor_id.clone(), monitor);
            }
        }

        rename_endpoint(conduits, manhole_id, monitor_id);
        claimed.insert(manhole_id.clone());
    }

    claimed
}

/// Points every conduit end at `from` to `to` instead.
fn rename_endpoint(conduits: &mut [Conduit], from: &Id, to: &Id) {
    for conduit in conduits.iter_mut() {
        let upstream_hit = conduit.upstream() == from;
        let downstream_hit = conduit.downstream() == from;
        if !upstream_hit && !downstream_hit {
            continue;
        }
        let upstream = if upstream_hit { to.clone() } else { conduit.upstream().clone() };
        let downstream = if downstream_hit {
            to.clone()
        } else {
            conduit.downstream().clone()
        };
        conduit.set_endpoints(upstream, downstream);
    }
}

/// Splits each configured conduit around a new monitor node.
fn split_conduits(
    nodes: &mut IndexMap<Id, Node>,
    conduits: &mut Vec<Conduit>,
    entries: &[(&Id, &MonitorInfo)],
) -> ClaimedManholes {
    let mut claimed = ClaimedManholes::new();

    for &(manhole_id, info) in entries {
        let monitor_id = info.monitor_name();
        let Some(link) = info.link() else {
            debug!(manhole = manhole_id.as_str(); "Skipping monitor entry without a link");
            continue;
        };
        if monitor_id.is_blank() {
            debug!(manhole = manhole_id.as_str(); "Skipping monitor entry without a monitor name");
            continue;
        }
        let Some(manhole) = nodes.get(manhole_id) else {
            debug!(manhole = manhole_id.as_str(); "Skipping monitor entry for unknown manhole");
            continue;
        };
        let Some(position) = conduits.iter().position(|conduit| conduit.id() == link) else {
            debug!(
                manhole = manhole_id.as_str(),
                link = link.as_str();
                "Skipping monitor entry for unknown link"
            );
            continue;
        };

        let original = conduits.remove(position);
        let midpoint = match (
            nodes.get(original.upstream()),
            nodes.get(original.downstream()),
        ) {
            (Some(up), Some(down)) => up.position().midpoint(down.position()),
            _ => manhole.position(),
        };

        let tooltip = monitor_tooltip(monitor_id, manhole_id, info, Some(link));
        nodes
            .entry(monitor_id.clone())
            .and_modify(|existing| existing.set_kind(NodeKind::FlowMonitor))
            .or_insert_with(|| Node::new(NodeKind::FlowMonitor, midpoint).with_tooltip(tooltip));

        let [to_monitor, from_monitor] = split_conduit(&original, monitor_id);
        conduits.insert(position, to_monitor);
        conduits.insert(position + 1, from_monitor);

        claimed.insert(manhole_id.clone());
    }

    claimed
}

/// Builds the `upstream -> monitor` and `monitor -> downstream` halves of a
/// conduit, keeping its type and colour.
fn split_conduit(original: &Conduit, monitor_id: &Id) -> [Conduit; 2] {
    let half = |upstream: &Id, downstream: &Id| {
        let conduit = Conduit::new(
            Id::connecting(upstream, downstream),
            upstream.clone(),
            downstream.clone(),
            original.kind(),
        );
        match original.colour() {
            Some(colour) => conduit.with_colour(colour),
            None => conduit,
        }
    };

    [
        half(original.upstream(), monitor_id),
        half(monitor_id, original.downstream()),
    ]
}

fn monitor_tooltip(
    monitor_id: &Id,
    manhole_id: &Id,
    info: &MonitorInfo,
    link: Option<&Id>,
) -> String {
    let mut lines = vec![monitor_id.to_string(), format!("Manhole: {manhole_id}")];
    if let Some(link) = link {
        lines.push(format!("Link: {link}"));
    }
    let note = info.note().trim();
    if !note.is_empty() {
        lines.push(note.to_string());
    }
    lines.join("\n")
}

/// Drops self-loops and every repeat of an `(upstream, downstream)` pair,
/// keeping the first occurrence.
pub(crate) fn retain_unique_links(conduits: &mut Vec<Conduit>) {
    let mut seen: HashSet<(Id, Id)> = HashSet::new();
    conduits.retain(|conduit| {
        if conduit.is_self_loop() {
            debug!(conduit = conduit.id().as_str(); "Dropping self-loop conduit");
            return false;
        }
        let key = (conduit.upstream().clone(), conduit.downstream().clone());
        if !seen.insert(key) {
            debug!(conduit = conduit.id().as_str(); "Dropping duplicate conduit");
            return false;
        }
        true
    });
}

/// Drops conduits whose endpoints are blank or missing from the node set.
pub(crate) fn prune_dangling(nodes: &IndexMap<Id, Node>, conduits: &mut Vec<Conduit>) {
    conduits.retain(|conduit| {
        let resolved = conduit.has_endpoints()
            && nodes.contains_key(conduit.upstream())
            && nodes.contains_key(conduit.downstream());
        if !resolved {
            debug!(
                conduit = conduit.id().as_str(),
                upstream = conduit.upstream().as_str(),
                downstream = conduit.downstream().as_str();
                "Dropping conduit with unresolved endpoint"
            );
        }
        resolved
    });
}

/// Prepares spliced conduits for layout: drops dangling conduits, then
/// self-loops and repeated links.
pub(crate) fn clean_links(nodes: &IndexMap<Id, Node>, conduits: &mut Vec<Conduit>) {
    let before = conduits.len();
    prune_dangling(nodes, conduits);
    retain_unique_links(conduits);
    if conduits.len() < before {
        debug!(dropped = before - conduits.len(); "Cleaned conduit list");
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use culvert_core::{geometry::Point, network::ConduitKind};

    use super::*;

    type Input = (
        IndexMap<Id, Node>,
        Vec<Conduit>,
        IndexMap<Id, MonitorInfo>,
    );

    fn input_strategy() -> impl Strategy<Value = Input> {
        let links = prop::collection::vec((0usize..6, 0usize..6), 0..14);
        let entries = prop::collection::vec((0usize..8, 0usize..3, prop::option::of(0usize..16)), 0..5);
        (links, entries).prop_map(|(links, entries)| {
            let nodes: IndexMap<Id, Node> = (0..6)
                .map(|i| {
                    (
                        Id::new(&format!("N{i}")),
                        Node::new(NodeKind::Manhole, Point::new(i as f64, 0.0)),
                    )
                })
                .collect();
            let conduits = links
                .iter()
                .enumerate()
                .map(|(i, (a, b))| {
                    Conduit::new(
                        Id::new(&format!("C{i}")),
                        Id::new(&format!("N{a}")),
                        Id::new(&format!("N{b}")),
                        ConduitKind::Conduit,
                    )
                })
                .collect();
            // Manholes N6 and N7 and links past the conduit count do not exist.
            let monitor_info = entries
                .iter()
                .map(|(manhole, monitor, link)| {
                    (
                        Id::new(&format!("N{manhole}")),
                        MonitorInfo::new(
                            Id::new(&format!("MON{monitor}")),
                            "",
                            link.map(|l| Id::new(&format!("C{l}"))),
                        ),
                    )
                })
                .collect();
            (nodes, conduits, monitor_info)
        })
    }

    fn check_spliced_links(
        (mut nodes, mut conduits, monitor_info): Input,
        strategy: SpliceStrategy,
    ) -> Result<(), TestCaseError> {
        let original: HashSet<Id> = nodes.keys().cloned().collect();
        let unspliced = conduits.clone();

        let claimed = splice(&mut nodes, &mut conduits, &monitor_info, strategy);

        if monitor_info.is_empty() {
            prop_assert_eq!(&conduits, &unspliced);
        } else {
            check_clean(&conduits)?;
        }
        for manhole in &claimed {
            prop_assert!(original.contains(manhole));
            prop_assert!(monitor_info.contains_key(manhole));
            if strategy == SpliceStrategy::Substitute {
                prop_assert!(!nodes.contains_key(manhole));
                prop_assert!(conduits.iter().all(|c| c.upstream() != manhole
                    && c.downstream() != manhole));
            } else {
                prop_assert!(nodes.contains_key(manhole));
            }
        }

        clean_links(&nodes, &mut conduits);
        check_clean(&conduits)?;
        for conduit in &conduits {
            prop_assert!(nodes.contains_key(conduit.upstream()));
            prop_assert!(nodes.contains_key(conduit.downstream()));
        }
        Ok(())
    }

    fn check_clean(conduits: &[Conduit]) -> Result<(), TestCaseError> {
        let mut pairs = HashSet::new();
        for conduit in conduits {
            prop_assert!(!conduit.is_self_loop());
            prop_assert!(pairs.insert(conduit.endpoints()));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn substitution_leaves_clean_links(input in input_strategy()) {
            check_spliced_links(input, SpliceStrategy::Substitute)?;
        }

        #[test]
        fn split_conduit_leaves_clean_links(input in input_strategy()) {
            check_spliced_links(input, SpliceStrategy::SplitConduit)?;
        }
    }
}
