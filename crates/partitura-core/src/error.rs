//! Error types for Partitura operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Partitura.
#[derive(Error, Debug)]
pub enum Error {
    /// A stored field could not be decoded.
    #[error("version {version_id}: cannot decode stored '{field}': {message}")]
    Decode {
        /// Identity of the version row.
        version_id: u64,
        /// Stored field name.
        field: &'static str,
        /// Decoder message.
        message: String,
    },

    /// Backing store read failed or returned inconsistent rows.
    #[error("source error: {0}")]
    Source(String),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot or config parse error.
    #[error("parse error: {0}")]
    Parse(#[from] sonic_rs::Error),

    /// IO error.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Path template rejected by the writer.
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a decode error for a stored version field.
    #[must_use]
    pub fn decode(version_id: u64, field: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            version_id,
            field,
            message: message.to_string(),
        }
    }
}

/// Result type for Partitura operations.
pub type Result<T> = std::result::Result<T, Error>;
