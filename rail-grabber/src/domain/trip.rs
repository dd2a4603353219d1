//! Trip types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tracked pair of stations.
///
/// Identity is the `(from, to)` name pair; the optional CRS codes are carried
/// along for display but take no part in equality.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Departure station name
    pub from: String,
    /// Destination station name
    pub to: String,
    /// Resolved departure station code, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_code: Option<String>,
    /// Resolved destination station code, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_code: Option<String>,
}

impl Trip {
    /// Create a trip between two named stations.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_code: None,
            to_code: None,
        }
    }

    /// Attach resolved station codes.
    pub fn with_codes(mut self, from_code: impl Into<String>, to_code: impl Into<String>) -> Self {
        self.from_code = Some(from_code.into());
        self.to_code = Some(to_code.into());
        self
    }

    /// Returns true if this trip runs between the named stations.
    pub fn is_between(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}

impl PartialEq for Trip {
    fn eq(&self, other: &Self) -> bool {
        self.is_between(&other.from, &other.to)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}
