//! Error types for the monitor hub and its sinks.
//!
//! Decode and coercion failures are contract violations raised by the
//! producer of training statistics; they are propagated and never swallowed.
//! Disk failures while persisting stats are handled inside the sink that hit
//! them and do not show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors raised by [`Monitors`](crate::monitor::Monitors) and its sinks.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Serialized summary bytes could not be decoded.
    #[error("Failed to decode summary ({len} bytes): {message}")]
    Decode { len: usize, message: String },

    /// A value pushed as a scalar is not numeric.
    #[error("Value for '{name}' is not a scalar: {value}")]
    NonNumeric { name: String, value: String },

    /// No value was ever recorded for the series.
    #[error("No scalar recorded for '{name}'")]
    NotFound { name: String },

    /// An existing stat file does not hold an array of row objects.
    #[error("Invalid stat file {path}: {message}\n  → Move or fix the file to resume")]
    CorruptStats { path: PathBuf, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid monitor configuration.
    #[error("Invalid monitor configuration: {message}")]
    ConfigParsing { message: String },

    /// Data was pushed before `setup` bound the hub to a trainer context.
    #[error("Monitors used before setup")]
    NotSetUp,

    /// `setup` was called twice.
    #[error("Monitors already set up")]
    AlreadySetUp,

    /// One or more sinks failed during teardown.
    #[error("{} monitor(s) failed during teardown", .failures.len())]
    Teardown { failures: Vec<MonitorError> },
}

impl MonitorError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a decode error for a serialized summary of `len` bytes.
    pub fn decode(len: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            len,
            message: message.into(),
        }
    }

    /// Check if this error is caused by a producer handing over bad data.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::NonNumeric { .. })
    }
}
