//! Error types for the hotbox repository engine.
//!
//! Each concern gets its own enum. Nothing here is fatal to the host:
//! validation and evaluation failures are logged and treated as "no match",
//! structural failures are retried by the finalize pass, and archive format
//! failures abort an import before the destination is touched.

use std::path::PathBuf;
use thiserror::Error;

/// Physical storage errors raised by the ordinal store and repair paths.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rename collision moving {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not an ordinal-named item: {0:?}")]
    NotAnItem(PathBuf),
}

/// Rule gating failures. Both variants cause the rule to contribute
/// `false`; neither aborts a resolution pass.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Static validation failed: the script never assigns the result
    /// variable, so it is rejected without being executed.
    #[error("rule {path:?} never assigns the result variable '{variable}'")]
    MissingResultVariable {
        path: PathBuf,
        variable: &'static str,
    },

    #[error("rule {path:?} failed to evaluate: {message}")]
    Evaluation { path: PathBuf, message: String },

    #[error("rule I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive export/import errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed archive container: {0}")]
    Format(String),

    #[error("invalid base64 payload: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("storage error during merge: {0}")]
    Store(#[from] StoreError),
}

/// Configuration loading and logging setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}
