//! Culvert - schematic drawings of stormwater and sewer networks.
//!
//! Turns a raw drainage network (manholes, monitors, and conduits of several
//! kinds) into a laid-out schematic: monitors are spliced in as nodes of
//! their own, plain manhole chains can be compressed away, and the result is
//! positioned, aligned, and de-overlapped.
//!
//! The pipeline stages are public modules so they can be used on their own:
//!
//! - [`splice`]: monitor splicing
//! - [`compress`]: manhole chain compression
//! - [`graph`]: the directed flow graph
//! - [`layout`]: topological and hierarchical placement
//! - [`flatten`]: axis alignment of near-straight segments
//! - [`overlap`]: minimum separation between nodes
//! - [`display`]: display kind resolution

pub mod compress;
pub mod config;
pub mod display;
pub mod flatten;
pub mod graph;
pub mod layout;
pub mod overlap;
pub mod splice;

mod error;

pub use culvert_core::{color, geometry, identifier, network};

pub use error::CulvertError;

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::Serialize;

use color::Color;
use config::AppConfig;
use graph::FlowGraph;
use identifier::Id;
use layout::LayoutOutcome;
use network::{Conduit, Network, Node, NodeKind};
use overlap::OverlapReport;
use splice::ClaimedManholes;

/// A laid-out schematic.
///
/// Nodes and conduits keep the shapes of the input [`Network`], with
/// positions overwritten by the layout stages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schematic {
    pub nodes: IndexMap<Id, Node>,
    pub conduits: Vec<Conduit>,
    /// Manholes that received a dedicated monitor node during splicing
    pub claimed: ClaimedManholes,
    /// Kind each node should be drawn as
    pub display_kinds: IndexMap<Id, NodeKind>,
    /// Colour each conduit should be drawn with
    pub conduit_colours: IndexMap<Id, Color>,
    pub layout: LayoutOutcome,
    pub overlap: OverlapReport,
}

impl Schematic {
    /// Returns the display kind of `id`, if the node is part of the schematic.
    pub fn display_kind(&self, id: &str) -> Option<&NodeKind> {
        self.display_kinds.get(id)
    }
}

/// Builder for drawing drainage network schematics.
///
/// # Examples
///
/// ```rust
/// use culvert::{SchematicBuilder, config::AppConfig};
/// use culvert::network::{Conduit, ConduitKind, Network, Node, NodeKind};
/// use culvert::geometry::Point;
///
/// let network = Network::new()
///     .with_node("M1", Node::new(NodeKind::Manhole, Point::new(0.0, 0.0)))
///     .with_node("O1", Node::new(NodeKind::Outfall, Point::new(100.0, 0.0)))
///     .with_conduit(Conduit::new("C1".into(), "M1".into(), "O1".into(), ConduitKind::Conduit));
///
/// let builder = SchematicBuilder::new(AppConfig::default());
/// let schematic = builder.draw(&network, false)
///     .expect("Failed to draw schematic");
///
/// assert_eq!(schematic.nodes.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SchematicBuilder {
    config: AppConfig,
}

impl SchematicBuilder {
    /// Create a new schematic builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Draw a schematic of `network`.
    ///
    /// The caller's network is never modified. Stages run in order: monitor
    /// splicing, removal of dangling, looping and repeated conduits, compression (when `compressed`
    /// is set), layout, flattening, overlap resolution and display kind
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns `CulvertError::Config` when the configuration cannot produce
    /// a meaningful layout. Malformed topology is skipped, not reported.
    pub fn draw(&self, network: &Network, compressed: bool) -> Result<Schematic, CulvertError> {
        self.config.validate()?;

        info!(
            nodes = network.nodes.len(),
            conduits = network.conduits.len(),
            monitors = network.monitors.len(),
            compressed;
            "Drawing schematic"
        );

        let mut nodes = network.nodes.clone();
        let mut conduits = network.conduits.clone();

        let claimed = splice::splice(
            &mut nodes,
            &mut conduits,
            &network.monitor_info,
            self.config.splice().strategy(),
        );
        splice::clean_links(&nodes, &mut conduits);
        debug!(nodes = nodes.len(), conduits = conduits.len(); "Network prepared");

        if compressed {
            let result = compress::compress(&conduits, &nodes, &network.monitors);
            nodes = result.nodes;
            conduits = result.conduits;
        }

        let graph = FlowGraph::from_conduits(&conduits);
        let summary = graph.summary();
        info!(
            nodes = summary.nodes,
            edges = summary.edges,
            components = summary.components,
            largest_component = summary.largest_component,
            cyclic = summary.cyclic;
            "Flow graph built"
        );

        let layout = layout::layout(&graph, &mut nodes, &conduits, self.config.layout());
        flatten::flatten(&mut nodes, &conduits, self.config.flatten());
        let overlap = overlap::resolve(&mut nodes, self.config.overlap());

        let display_kinds = display::display_kinds(&nodes, &network.monitors, &claimed);
        trace!(display_kinds:?; "Resolved display kinds");

        let mut conduit_colours = IndexMap::with_capacity(conduits.len());
        for conduit in &conduits {
            conduit_colours
                .entry(conduit.id().clone())
                .or_insert_with(|| conduit.display_colour());
        }

        info!(nodes = nodes.len(), conduits = conduits.len(); "Schematic drawn");
        Ok(Schematic {
            nodes,
            conduits,
            claimed,
            display_kinds,
            conduit_colours,
            layout,
            overlap,
        })
    }
}
