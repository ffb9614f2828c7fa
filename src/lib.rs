//! whisker - Cat collar telemetry hub
//!
//! Collects status telemetry from networked collar devices, persists it to an
//! append-only status log, derives per-device activity totals and the current
//! "leader" collar, and pushes both raw and derived views to WebSocket
//! subscribers.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`devices`] - Fixed registry of known collar devices
//! - [`parser`] - Status log line parsing (both wire formats)
//! - [`models`] - Core data structures and types
//! - [`store`] - Append-only status log on disk
//! - [`aggregate`] - Full-log reduction into duration totals and leader selection
//! - [`publish`] - Interval and event driven fan-out to subscribers
//! - [`ingest`] - TCP/UDP sinks that append device payloads to the log
//! - [`hub`] - HTTP/WebSocket server surface
//!
//! # Example
//!
//! ```no_run
//! use whisker::aggregate::{leader::select_leader, Aggregator};
//!
//! let aggregator = Aggregator::new();
//! let (table, report) =
//!     aggregator.scan("Port 3334 | ID 1729875494654 | Message: 00:03:01, Cat state: Wander Time");
//! assert_eq!(select_leader(&table).map(|d| d.id()), Some("2"));
//! assert_eq!(report.records, 1);
//! ```

pub mod aggregate;
pub mod config;
pub mod devices;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod publish;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aggregate::leader::{select_leader, LeaderBoard};
    pub use crate::aggregate::{AggregateTable, Aggregator};
    pub use crate::config::Config;
    pub use crate::devices::CatDevice;
    pub use crate::error::{Error, Result};
    pub use crate::models::{GroupedRecords, LineFormat, ScanReport, StatusRecord};
    pub use crate::parser::{parse_line, LineError};
    pub use crate::publish::Publisher;
    pub use crate::store::StatusLog;
}

// Direct re-exports for convenience
pub use devices::CatDevice;
pub use models::{GroupedRecords, LineFormat, ScanReport, StatusRecord};
