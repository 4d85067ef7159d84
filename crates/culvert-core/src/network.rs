//! Network asset records.
//!
//! These are the typed shapes exchanged with the surrounding import and
//! rendering layers: nodes (manholes, monitors, structures), conduits
//! (pipes and the hydraulic controls that behave like pipes), the monitor
//! overlay and per-manhole monitor configuration. The same shapes are used
//! before and after layout; only node coordinates change meaning.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{color::Color, geometry::Point, identifier::Id};

/// The kind of a network node.
///
/// Unrecognized kinds are preserved verbatim so that the rendering layer can
/// still choose a symbol for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    #[default]
    Manhole,
    FlowMonitor,
    Weir,
    Outfall,
    Storage,
    Other(String),
}

impl NodeKind {
    /// Returns `true` for plain manholes, the only kind that compression
    /// treats as transparent.
    pub fn is_manhole(&self) -> bool {
        matches!(self, Self::Manhole)
    }

    /// Returns the canonical lowercase name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manhole => "manhole",
            Self::FlowMonitor => "flowmonitor",
            Self::Weir => "weir",
            Self::Outfall => "outfall",
            Self::Storage => "storage",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let kind = match trimmed.to_ascii_lowercase().as_str() {
            "manhole" => Self::Manhole,
            "flowmonitor" | "flow_monitor" | "flow monitor" | "monitor" => Self::FlowMonitor,
            "weir" => Self::Weir,
            "outfall" => Self::Outfall,
            "storage" => Self::Storage,
            _ => Self::Other(trimmed.to_string()),
        };
        Ok(kind)
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        let Ok(kind) = value.parse::<NodeKind>();
        kind
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a conduit (directed link between two nodes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConduitKind {
    #[default]
    Conduit,
    UserControl,
    FlapValve,
    Pump,
    Sluice,
    Weir,
    Flume,
    Orifice,
}

impl ConduitKind {
    /// Returns the canonical snake_case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conduit => "conduit",
            Self::UserControl => "user_control",
            Self::FlapValve => "flap_valve",
            Self::Pump => "pump",
            Self::Sluice => "sluice",
            Self::Weir => "weir",
            Self::Flume => "flume",
            Self::Orifice => "orifice",
        }
    }

    /// Returns the colour a connector of this kind is drawn with when the
    /// conduit carries no explicit override.
    pub fn default_colour(self) -> Color {
        Color::named(match self {
            Self::Conduit => "black",
            Self::UserControl => "purple",
            Self::FlapValve => "darkorange",
            Self::Pump => "red",
            Self::Sluice => "teal",
            Self::Weir => "blue",
            Self::Flume => "green",
            Self::Orifice => "brown",
        })
    }
}

impl From<&str> for ConduitKind {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "conduit" | "link" | "" => Self::Conduit,
            "user_control" => Self::UserControl,
            "flap_valve" => Self::FlapValve,
            "pump" => Self::Pump,
            "sluice" => Self::Sluice,
            "weir" => Self::Weir,
            "flume" => Self::Flume,
            "orifice" => Self::Orifice,
            _ => {
                debug!(conduit_type = value; "Unrecognized conduit type, treating as conduit");
                Self::Conduit
            }
        }
    }
}

impl From<String> for ConduitKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConduitKind> for String {
    fn from(kind: ConduitKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ConduitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network node record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default)]
    kind: NodeKind,

    #[serde(default)]
    x: f64,

    #[serde(default)]
    y: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
}

impl Node {
    /// Creates a node of the given kind at the given position.
    pub fn new(kind: NodeKind, position: Point) -> Self {
        Self {
            kind,
            x: position.x(),
            y: position.y(),
            tooltip: None,
        }
    }

    /// Sets the free-text tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Returns the stored kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Replaces the stored kind.
    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    /// Returns the node position.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Moves the node.
    pub fn set_position(&mut self, position: Point) {
        self.x = position.x();
        self.y = position.y();
    }

    /// Returns the tooltip text, if any.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }
}

/// A directed conduit record, running from `upstream` to `downstream`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conduit {
    #[serde(default)]
    id: Id,

    #[serde(default)]
    upstream: Id,

    #[serde(default)]
    downstream: Id,

    #[serde(rename = "type", default)]
    kind: ConduitKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    colour: Option<String>,
}

impl Conduit {
    /// Creates a conduit without a colour override.
    pub fn new(id: Id, upstream: Id, downstream: Id, kind: ConduitKind) -> Self {
        Self {
            id,
            upstream,
            downstream,
            kind,
            colour: None,
        }
    }

    /// Sets an explicit colour override.
    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn upstream(&self) -> &Id {
        &self.upstream
    }

    pub fn downstream(&self) -> &Id {
        &self.downstream
    }

    pub fn kind(&self) -> ConduitKind {
        self.kind
    }

    /// Returns the raw colour override, if any.
    pub fn colour(&self) -> Option<&str> {
        self.colour.as_deref()
    }

    /// Returns `true` if both endpoints are non-blank.
    pub fn has_endpoints(&self) -> bool {
        !self.upstream.is_blank() && !self.downstream.is_blank()
    }

    /// Returns `true` if the conduit starts and ends at the same node.
    pub fn is_self_loop(&self) -> bool {
        self.upstream == self.downstream
    }

    /// Returns the `(upstream, downstream)` pair used for de-duplication.
    pub fn endpoints(&self) -> (&Id, &Id) {
        (&self.upstream, &self.downstream)
    }

    /// Rewrites both endpoints.
    pub fn set_endpoints(&mut self, upstream: Id, downstream: Id) {
        self.upstream = upstream;
        self.downstream = downstream;
    }

    /// Returns the colour the connector should be drawn with.
    ///
    /// An override that is not a valid CSS colour is reported and ignored.
    pub fn display_colour(&self) -> Color {
        match self.colour.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Color::new(raw).unwrap_or_else(|err| {
                warn!(conduit = self.id.as_str(), error = err.as_str(); "Ignoring colour override");
                self.kind.default_colour()
            }),
            _ => self.kind.default_colour(),
        }
    }
}

/// Marker record for a node that carries a monitor.
///
/// Only presence in [`Network::monitors`] is significant. The sensor list
/// mirrors the monitor table and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sensors: Vec<String>,
}

impl Monitor {
    pub fn new(sensors: Vec<String>) -> Self {
        Self { sensors }
    }

    pub fn sensors(&self) -> &[String] {
        &self.sensors
    }
}

/// Monitor configuration for a manhole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorInfo {
    /// Identifier of the monitor node to create.
    #[serde(default)]
    monitor_name: Id,

    #[serde(default)]
    note: String,

    /// Conduit the monitor is attached to; `None` when left blank.
    #[serde(
        default,
        deserialize_with = "deserialize_blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    link: Option<Id>,
}

impl MonitorInfo {
    pub fn new(monitor_name: Id, note: impl Into<String>, link: Option<Id>) -> Self {
        Self {
            monitor_name,
            note: note.into(),
            link: link.filter(|link| !link.is_blank()),
        }
    }

    pub fn monitor_name(&self) -> &Id {
        &self.monitor_name
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn link(&self) -> Option<&Id> {
        self.link.as_ref()
    }
}

fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<Id>::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.is_blank()))
}

/// The full input of one layout run.
///
/// Node and monitor maps preserve insertion order so the output lists
/// records in the order the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(default)]
    pub nodes: IndexMap<Id, Node>,

    #[serde(default)]
    pub conduits: Vec<Conduit>,

    #[serde(default)]
    pub monitors: IndexMap<Id, Monitor>,

    #[serde(default)]
    pub monitor_info: IndexMap<Id, MonitorInfo>,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a node.
    pub fn with_node(mut self, id: impl Into<Id>, node: Node) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Appends a conduit.
    pub fn with_conduit(mut self, conduit: Conduit) -> Self {
        self.conduits.push(conduit);
        self
    }

    /// Marks a node as carrying a monitor.
    pub fn with_monitor(mut self, id: impl Into<Id>) -> Self {
        self.monitors.insert(id.into(), Monitor::default());
        self
    }

    /// Adds monitor configuration for a manhole.
    pub fn with_monitor_info(mut self, manhole: impl Into<Id>, info: MonitorInfo) -> Self {
        self.monitor_info.insert(manhole.into(), info);
        self
    }
}
