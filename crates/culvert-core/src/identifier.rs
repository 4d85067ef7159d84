//! Canonical identifiers for network nodes and conduits.
//!
//! Asset tables arrive from spreadsheets and CSV exports where the same
//! manhole may be spelled `"1203"`, `1203`, `1203.0` or `" 1203 "`. This
//! module provides the [`Id`] type which normalizes all of these to a single
//! canonical string at ingestion, so later stages compare identifiers with
//! plain equality.

use std::{borrow::Borrow, fmt};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

/// Canonical identifier of a node or conduit.
///
/// The canonical form is the input with surrounding whitespace trimmed.
/// Identifiers are ordered lexicographically by that form, which is the
/// order every deterministic traversal in the engine relies on.
///
/// # Examples
///
/// ```
/// use culvert_core::identifier::Id;
///
/// let a = Id::new("  MH-01 ");
/// let b = Id::new("MH-01");
/// assert_eq!(a, b);
/// assert_eq!(a, "MH-01");
///
/// // Synthesized identifiers for fabricated conduits
/// let link = Id::connecting(&Id::new("A"), &Id::new("B"));
/// assert_eq!(link, "A_to_B");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(String);

impl Id {
    /// Creates an `Id` from a raw string, trimming surrounding whitespace.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_string())
    }

    /// Creates the identifier of a synthesized conduit running from
    /// `upstream` to `downstream`.
    pub fn connecting(upstream: &Id, downstream: &Id) -> Self {
        Self(format!("{upstream}_to_{downstream}"))
    }

    /// Returns `true` if the canonical form is empty.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor)
    }
}

/// Accepts both textual and numeric identifiers.
struct IdVisitor;

impl Visitor<'_> for IdVisitor {
    type Value = Id;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string or numeric identifier")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Id, E> {
        Ok(Id::new(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Id, E> {
        Ok(Id::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Id, E> {
        Ok(Id(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Id, E> {
        Ok(Id(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Id, E> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(Id(format!("{}", value as i64)))
        } else {
            Ok(Id(value.to_string()))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Id, E> {
        Ok(Id::default())
    }
}
