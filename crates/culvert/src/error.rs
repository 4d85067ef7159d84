//! Error types for Culvert operations.
//!
//! This module provides the main error type [`CulvertError`]. Malformed
//! topology is never an error; bad rows are skipped and logged by the stage
//! that meets them. What remains fatal is configuration that cannot produce
//! a meaningful layout and I/O performed on behalf of callers.

use std::io;

use thiserror::Error;

/// The main error type for Culvert operations.
#[derive(Debug, Error)]
pub enum CulvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Input error: {0}")]
    Input(String),
}
