// Core data structures for the whisker telemetry hub

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::devices::CatDevice;

/// Wire format of a status log line
///
/// Two schemas coexist in one log file over the system's lifetime. The
/// discriminant is kept on every parsed record so downstream consumers can
/// tell which pipeline a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    /// Legacy comma-delimited format:
    /// `<ISO timestamp>, <host>:<port>, <freeform state text>`
    Csv,
    /// Current pipe-delimited format:
    /// `Port <port> | ID <id> | Message: <duration>, Cat state: <label>`
    Piped,
}

impl LineFormat {
    /// Short name used in logs and failure counters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Piped => "piped",
        }
    }
}

impl std::fmt::Display for LineFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized status record parsed from a log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Device resolved from the reporting port
    pub device: CatDevice,

    /// ISO timestamp (csv format) or device-reported ID (piped format)
    pub stamp: String,

    /// Accumulated seconds reported for this state.
    /// Always 0 for csv records, which carry no duration field.
    pub duration_secs: u64,

    /// Free-text state label, trimmed. May be empty.
    pub state: String,

    /// Which wire format the line was in
    pub format: LineFormat,
}

impl StatusRecord {
    /// Whether this record contributes to duration totals.
    /// Csv records are duration-less and feed only the raw grouped view.
    pub fn has_duration(&self) -> bool {
        self.format == LineFormat::Piped
    }
}

/// Raw records grouped by device id, unfiltered by state
///
/// This is the payload of the data feed: subscribers render the full
/// per-device record history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedRecords(pub BTreeMap<String, Vec<StatusRecord>>);

impl GroupedRecords {
    /// Group records by device id, preserving line order within each device
    pub fn from_records(records: impl IntoIterator<Item = StatusRecord>) -> Self {
        let mut groups: BTreeMap<String, Vec<StatusRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.device.id().to_string())
                .or_default()
                .push(record);
        }
        Self(groups)
    }

    /// Number of devices with at least one record
    pub fn device_count(&self) -> usize {
        self.0.len()
    }

    /// Total record count across all devices
    pub fn record_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Per-kind parse failure counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    /// Lines with a port outside the fixed device table
    pub unknown_port: u64,

    /// Lines with a non-numeric duration component
    pub bad_duration: u64,

    /// Lines matching neither wire format
    pub unknown_format: u64,

    /// Piped lines missing a required field
    pub missing_field: u64,
}

impl FailureCounts {
    /// Total failures across all kinds
    pub fn total(&self) -> u64 {
        self.unknown_port + self.bad_duration + self.unknown_format + self.missing_field
    }
}

/// Diagnostics from one full scan of the status log
///
/// A scan never aborts on a bad line; everything it skipped is counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Lines seen, including blank ones
    pub lines: u64,

    /// Blank or whitespace-only lines (skipped silently, not failures)
    pub blank: u64,

    /// Records successfully parsed
    pub records: u64,

    /// Parse failures by kind
    pub failures: FailureCounts,
}

impl ScanReport {
    /// Total lines skipped due to parse failures
    pub fn failed(&self) -> u64 {
        self.failures.total()
    }
}
