//! Core types and traits for mdindex
//!
//! This crate defines the foundational pieces shared by the storage and
//! engine crates:
//! - Error: Error type hierarchy and `Result` alias
//! - Traits: the ordered key-value store contract (`KeyStore`, `StoreSnapshot`, `StoreCursor`)
//! - WriteBatch: ordered put/delete operations committed atomically
//! - KeySpace: byte-range encodings for source records, index records and index meta records
//! - Document: the structured value stored for each source record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod error;
pub mod keyspace;
pub mod traits;

pub use batch::{BatchOp, WriteBatch};
pub use error::{Error, Result};
pub use keyspace::{IndexKeys, SOURCE_PREFIX};
pub use traits::{KeyStore, StoreCursor, StoreSnapshot};

/// Structured document stored as the value of a source record.
///
/// Source records arrive from the sync layer as JSON objects, e.g.
/// `{"path": "/Photos/cat.jpg", "is_dir": false, "rev": "8cdc23804a74", ...}`.
pub type Document = serde_json::Value;
