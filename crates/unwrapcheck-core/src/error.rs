//! Error types for unwrapcheck
//!
//! All fallible operations return `Result<T, Error>`.
//! Findings about checked code are never errors: they are diagnostics
//! (see [`crate::check::Diagnostic`]). Errors here mean the input could not
//! be read, parsed, or configured.

use std::path::PathBuf;

/// unwrapcheck operational error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Syntax or structure violation while reading Go source
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A package could not be assembled from its files
    #[error("Resolve error: {0}")]
    ResolveError(String),

    /// Invalid configuration file or option
    #[error("Config error: {0}")]
    ConfigError(String),

    /// File system failure
    #[error("I/O error on {}: {message}", path.display())]
    IoError { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Error::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for unwrapcheck operations
pub type Result<T> = std::result::Result<T, Error>;
