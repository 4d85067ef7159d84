//! Error adapter for converting CulvertError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use culvert::CulvertError;

/// Adapter presenting a [`CulvertError`] as a miette diagnostic.
pub struct ErrorAdapter<'a>(pub &'a CulvertError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CulvertError::Io(_) => "culvert::io",
            CulvertError::Config(_) => "culvert::config",
            CulvertError::Layout(_) => "culvert::layout",
            CulvertError::Input(_) => "culvert::input",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CulvertError::Config(_) => {
                "check the [layout], [flatten] and [overlap] sections of the configuration file"
            }
            CulvertError::Input(_) => {
                "the input must be a JSON object with nodes, conduits, monitors and monitorInfo"
            }
            CulvertError::Io(_) | CulvertError::Layout(_) => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wrap a [`CulvertError`] for rendering by miette.
pub fn to_reportable(err: &CulvertError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}
