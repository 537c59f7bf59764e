//! Error types for the memex index.

use thiserror::Error;

/// All errors that can occur in the memex index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A raw submission could not be turned into an index document.
    #[error("Derivation failed: {0}")]
    Derivation(String),

    /// No reverse-index document exists for the page id.
    #[error("No indexed page found for ID: {0}")]
    PageNotFound(String),

    /// No meta entry exists for the timestamp id.
    #[error("No existing value exists for supplied timestamp ID: {0}")]
    TimestampNotFound(String),

    /// The underlying key/value store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// A key holds a value of the wrong shape.
    #[error("Unexpected value under key {key}: expected {expected}")]
    UnexpectedValue { key: String, expected: &'static str },

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compression error.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Invalid magic bytes in snapshot header.
    #[error("Invalid magic bytes in snapshot header")]
    InvalidMagic,

    /// Unsupported snapshot format version.
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    /// Snapshot is empty or truncated.
    #[error("Snapshot is empty or truncated")]
    Truncated,

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed command input.
    #[error("Invalid input: {0}")]
    Usage(String),

    /// The write queue worker is gone.
    #[error("Write queue is closed")]
    QueueClosed,

    /// A queued job panicked before producing a result.
    #[error("Queued job aborted before completion")]
    JobAborted,
}

impl IndexError {
    /// Whether this error is a violated precondition (referenced id not indexed).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            IndexError::PageNotFound(_) | IndexError::TimestampNotFound(_)
        )
    }
}

/// Convenience result type for memex index operations.
pub type IndexResult<T> = Result<T, IndexError>;
