//! Unified error handling for the whisker crate
//!
//! Domain-specific errors ([`LineError`], [`StoreError`], [`HubError`]) stay
//! usable on their own at the layer that produces them; this module wraps
//! them in a single [`Error`] enum for code that crosses module boundaries.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::hub::server::HubError;
pub use crate::parser::LineError;
pub use crate::store::StoreError;

/// Unified error type for the whisker crate
#[derive(Error, Debug)]
pub enum Error {
    /// Line parse errors
    #[error("Parse error: {0}")]
    Line(#[from] LineError),

    /// Status log read/write errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Hub server errors
    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
