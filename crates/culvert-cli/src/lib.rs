//! CLI logic for the Culvert schematic tool.
//!
//! Reads a network as JSON, runs it through the schematic pipeline, and
//! writes the laid-out schematic back as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, StrategyArg};

use std::{fs, io};

use log::info;

use culvert::{CulvertError, SchematicBuilder, network::Network};

/// Run the Culvert CLI application
///
/// This function reads the input network, draws the schematic, and writes
/// the result to the output file.
///
/// # Errors
///
/// Returns `CulvertError` for:
/// - File I/O errors
/// - Configuration loading or validation errors
/// - Input that is not a valid network document
pub fn run(args: &Args) -> Result<(), CulvertError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing network"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(strategy) = args.strategy {
        app_config = app_config.with_splice_strategy(strategy.into());
    }

    let source = fs::read_to_string(&args.input)?;
    let network: Network = serde_json::from_str(&source)
        .map_err(|err| CulvertError::Input(format!("{}: {err}", args.input)))?;

    let builder = SchematicBuilder::new(app_config);
    let schematic = builder.draw(&network, args.compressed)?;

    let json = serde_json::to_string_pretty(&schematic).map_err(io::Error::from)?;
    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Schematic exported successfully");

    Ok(())
}
