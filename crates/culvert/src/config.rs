//! Configuration types for schematic generation.
//!
//! This module provides configuration structures that control how monitor
//! placements are spliced into the network and how the schematic is laid
//! out. All types implement [`serde::Deserialize`] with every field
//! defaulted, so a configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`SpliceConfig`] - Selects the [`SpliceStrategy`].
//! - [`LayoutConfig`] - Selects the [`LayoutEngine`] and its parameters.
//! - [`FlattenConfig`] - Axis alignment of near-straight segments.
//! - [`OverlapConfig`] - Minimum separation between nodes.
//!
//! # Example
//!
//! ```
//! # use culvert::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.layout().edge_length(), 150.0);
//! ```

use serde::Deserialize;

use crate::CulvertError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    splice: SpliceConfig,

    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    flatten: FlattenConfig,

    #[serde(default)]
    overlap: OverlapConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        splice: SpliceConfig,
        layout: LayoutConfig,
        flatten: FlattenConfig,
        overlap: OverlapConfig,
    ) -> Self {
        Self {
            splice,
            layout,
            flatten,
            overlap,
        }
    }

    pub fn splice(&self) -> &SpliceConfig {
        &self.splice
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn flatten(&self) -> &FlattenConfig {
        &self.flatten
    }

    pub fn overlap(&self) -> &OverlapConfig {
        &self.overlap
    }

    /// Replaces the splice strategy, keeping every other setting.
    pub fn with_splice_strategy(mut self, strategy: SpliceStrategy) -> Self {
        self.splice.strategy = strategy;
        self
    }

    /// Checks that every numeric parameter can produce a meaningful layout.
    ///
    /// # Errors
    ///
    /// Returns [`CulvertError::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), CulvertError> {
        require_positive("layout.edge_length", self.layout.edge_length)?;
        require_positive("layout.root_spacing", self.layout.root_spacing)?;
        require_positive("layout.hierarchical_scale", self.layout.hierarchical_scale)?;
        require_positive("overlap.min_separation", self.overlap.min_separation)?;

        let threshold = self.flatten.angle_threshold_deg;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 45.0 {
            return Err(CulvertError::Config(format!(
                "flatten.angle_threshold_deg must be in (0, 45], got {threshold}"
            )));
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), CulvertError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CulvertError::Config(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

/// How monitor placements are merged into the network topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpliceStrategy {
    /// Replace the configured manhole by a monitor node.
    #[default]
    Substitute,
    /// Split the configured conduit in two around a new monitor node.
    SplitConduit,
}

/// Monitor splicing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpliceConfig {
    #[serde(default)]
    strategy: SpliceStrategy,
}

impl SpliceConfig {
    pub fn new(strategy: SpliceStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SpliceStrategy {
        self.strategy
    }
}

/// Which placement algorithm the layout stage runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEngine {
    /// Topological when most nodes carry real coordinates, hierarchical
    /// otherwise.
    #[default]
    Auto,
    Topological,
    Hierarchical,
}

/// Layout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    engine: LayoutEngine,

    /// Logical length of every placed edge.
    edge_length: f64,

    /// Horizontal gap between root seeds, in multiples of `edge_length`.
    root_spacing: f64,

    /// Scale applied to hierarchical layout coordinates.
    hierarchical_scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: LayoutEngine::Auto,
            edge_length: 150.0,
            root_spacing: 2.5,
            hierarchical_scale: 1.5,
        }
    }
}

impl LayoutConfig {
    pub fn engine(&self) -> LayoutEngine {
        self.engine
    }

    pub fn edge_length(&self) -> f64 {
        self.edge_length
    }

    pub fn root_spacing(&self) -> f64 {
        self.root_spacing
    }

    pub fn hierarchical_scale(&self) -> f64 {
        self.hierarchical_scale
    }

    pub fn with_engine(mut self, engine: LayoutEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_edge_length(mut self, edge_length: f64) -> Self {
        self.edge_length = edge_length;
        self
    }
}

/// Segment flattening configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    enabled: bool,
    angle_threshold_deg: f64,
    max_passes: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            angle_threshold_deg: 15.0,
            max_passes: 5,
        }
    }
}

impl FlattenConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn angle_threshold_deg(&self) -> f64 {
        self.angle_threshold_deg
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Overlap resolution configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    enabled: bool,
    min_separation: f64,
    max_iterations: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_separation: 60.0,
            max_iterations: 200,
        }
    }
}

impl OverlapConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn min_separation(&self) -> f64 {
        self.min_separation
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_separation(mut self, min_separation: f64) -> Self {
        self.min_separation = min_separation;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.splice().strategy(), SpliceStrategy::Substitute);
        assert_eq!(config.layout().engine(), LayoutEngine::Auto);
        assert_eq!(config.layout().root_spacing(), 2.5);
        assert_eq!(config.layout().hierarchical_scale(), 1.5);
        assert!(config.flatten().enabled());
        assert_eq!(config.flatten().angle_threshold_deg(), 15.0);
        assert_eq!(config.flatten().max_passes(), 5);
        assert_eq!(config.overlap().min_separation(), 60.0);
        assert_eq!(config.overlap().max_iterations(), 200);
    }

    #[test]
    fn test_validate_rejects_non_positive_edge_length() {
        let config = AppConfig::new(
            SpliceConfig::default(),
            LayoutConfig::default().with_edge_length(0.0),
            FlattenConfig::default(),
            OverlapConfig::default(),
        );

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout.edge_length"));
    }

    #[test]
    fn test_validate_rejects_nan_separation() {
        let config = AppConfig::new(
            SpliceConfig::default(),
            LayoutConfig::default(),
            FlattenConfig::default(),
            OverlapConfig::default().with_min_separation(f64::NAN),
        );

        assert!(matches!(config.validate(), Err(CulvertError::Config(_))));
    }

    #[test]
    fn test_with_splice_strategy() {
        let config = AppConfig::default().with_splice_strategy(SpliceStrategy::SplitConduit);
        assert_eq!(config.splice().strategy(), SpliceStrategy::SplitConduit);
    }
}
