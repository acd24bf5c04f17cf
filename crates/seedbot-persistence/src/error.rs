//! Error types for the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to read a state file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a state file.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a state directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A state file exists but does not parse. This is fatal at startup:
    /// starting with unknown dedup state would re-notify everything.
    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize state for writing.
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
