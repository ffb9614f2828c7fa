//! Fixed registry of known collar devices
//!
//! Every collar is identified on the wire by the port it reports on. The
//! port-to-id table is fixed: the fleet is three collars, and every layer
//! (parser, aggregator, leader selection) iterates them in the same order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A known collar device
///
/// The numeric ids ("1", "2", "3") double as the wire representation on the
/// leader feed, so they never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CatDevice {
    /// Collar reporting on port 3333
    One,
    /// Collar reporting on port 3334
    Two,
    /// Collar reporting on port 3335
    Three,
}

impl CatDevice {
    /// All known devices, in the fixed iteration order used everywhere
    pub fn all() -> Vec<Self> {
        vec![Self::One, Self::Two, Self::Three]
    }

    /// Logical id as reported to subscribers
    pub fn id(&self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
        }
    }

    /// The port this device reports on
    pub fn port(&self) -> u16 {
        match self {
            Self::One => 3333,
            Self::Two => 3334,
            Self::Three => 3335,
        }
    }

    /// Resolve a raw port number to a device
    pub fn from_port(port: u16) -> Option<Self> {
        match port {
            3333 => Some(Self::One),
            3334 => Some(Self::Two),
            3335 => Some(Self::Three),
            _ => None,
        }
    }

    /// Resolve a logical id ("1", "2", "3") to a device
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            "3" => Some(Self::Three),
            _ => None,
        }
    }
}

impl fmt::Display for CatDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for CatDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("unknown device id: {s}"))
    }
}

impl Default for CatDevice {
    fn default() -> Self {
        Self::One
    }
}

impl From<CatDevice> for String {
    fn from(device: CatDevice) -> Self {
        device.id().to_string()
    }
}

impl TryFrom<String> for CatDevice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
