//! Status log line parsing
//!
//! Two wire formats coexist in the same log file (see
//! [`crate::models::LineFormat`]). Format detection is a pure classification
//! step, separate from field extraction; both steps are infallible in the
//! "never panics" sense and report problems as typed [`LineError`]s that
//! callers count and skip.

pub mod duration;
pub mod line;

// Re-export the parsing entry points
pub use duration::parse_duration;
pub use line::{detect_format, parse_line};

use thiserror::Error;

/// Errors produced while parsing a single status log line
///
/// None of these is fatal: the aggregator counts the failure and moves on to
/// the next line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Port outside the fixed device table; carries the raw value for
    /// diagnostics
    #[error("unknown port: {port}")]
    UnknownPort { port: String },

    /// Non-numeric duration component
    #[error("malformed duration: {text:?}")]
    BadDuration { text: String },

    /// Line matches neither wire format
    #[error("unrecognized line format")]
    UnknownFormat,

    /// Piped line missing a required field
    #[error("missing field: {field}")]
    MissingField { field: &'static str },
}

impl LineError {
    /// Failure kind label used in metrics and scan reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPort { .. } => "unknown_port",
            Self::BadDuration { .. } => "bad_duration",
            Self::UnknownFormat => "unknown_format",
            Self::MissingField { .. } => "missing_field",
        }
    }
}
