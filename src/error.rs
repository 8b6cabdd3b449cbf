use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `lockwhy` crate.
#[derive(Debug, Error)]
pub enum LockwhyError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The lockfiles archive could not be gunzipped.
    #[error("invalid gzip stream: {0}")]
    Gzip(#[source] std::io::Error),

    /// Fetching the lockfiles archive over HTTP failed.
    #[error("http request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// An error during serialization or deserialization (engine output, JSON rendering).
    #[error("serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The dependency-query engine process failed.
    #[error("dependency engine failed: {0}")]
    Engine(String),

    /// A wrapper for any other error that doesn't fit the specific variants.
    #[error("an unexpected error occurred: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl LockwhyError {
    /// I/O error with path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LockwhyError::Io {
            source,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LockwhyError>;
