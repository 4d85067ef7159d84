//! Command-line argument definitions for the Culvert CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the pipeline switches, and logging verbosity.

use clap::{Parser, ValueEnum};

use culvert::config::SpliceStrategy;

/// Command-line arguments for the Culvert schematic tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input network JSON file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output schematic JSON file
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Collapse plain manhole chains between monitors and structures
    #[arg(long)]
    pub compressed: bool,

    /// Override the configured monitor splicing strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Monitor splicing strategy as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Replace the manhole by its monitor
    Substitute,
    /// Split the linked conduit around the monitor
    SplitConduit,
}

impl From<StrategyArg> for SpliceStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Substitute => SpliceStrategy::Substitute,
            StrategyArg::SplitConduit => SpliceStrategy::SplitConduit,
        }
    }
}
