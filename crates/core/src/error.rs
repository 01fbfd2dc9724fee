//! Error types for mdindex
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for mdindex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the index engine
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files, on-disk stores)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage layer error (open, read, batch commit)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Stored bytes that do not decode into the expected shape
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Configuration could not be read or is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rebuilding an index failed; the index keeps its pre-rebuild state
    #[error("Rebuilding index \"{index}\" failed: {reason}")]
    Rebuild {
        /// Name of the index being rebuilt
        index: String,
        /// Underlying store error text
        reason: String,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl Error {
    /// Construct a storage error from anything displayable
    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Error::StorageError(msg.to_string())
    }
}
