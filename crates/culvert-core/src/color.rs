//! Display colours for schematic connectors
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Conduits carry an optional colour override as a CSS
//! colour string; the renderer receives a parsed [`Color`].

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;
use serde::{Serialize, Serializer};

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS colour string such as "#ff0000",
    /// "rgb(255, 0, 0)" or "red".
    ///
    /// # Examples
    ///
    /// ```
    /// use culvert_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// assert!(Color::new("not-a-colour").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str.trim()) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid colour `{color_str}`: {err}")),
        }
    }

    /// Parses a colour that is known to be valid.
    ///
    /// # Panics
    /// Panics if `color_str` is not a CSS colour. Only used with literals.
    pub(crate) fn named(color_str: &'static str) -> Self {
        Self::new(color_str).expect("built-in colour names are valid CSS colours")
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::named("black")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
