//! Error types for readmepulse.
//!
//! Library crates use [`ReadmeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Source clients do not surface these errors from `fetch`; they report
//! [`crate::FetchResult::Unavailable`] instead. `ReadmeError` is reserved for
//! failures that end the run: document I/O, bad configuration, commit failure.

use std::path::PathBuf;

/// Top-level error type for all readmepulse operations.
#[derive(Debug, thiserror::Error)]
pub enum ReadmeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside a source client (e.g. building the client).
    #[error("network error: {0}")]
    Network(String),

    /// Payload or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid anchor pattern, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Version-control publish failure (commit could not be created).
    #[error("publish error: {0}")]
    Publish(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReadmeError>;

impl ReadmeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
