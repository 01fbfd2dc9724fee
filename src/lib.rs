//! mdindex - incremental, versioned secondary indexes over a synced metadata cache
//!
//! Source records (one JSON document per synced file or folder) live in an
//! ordered key-value store. Every registered index maps each source record to
//! zero or more index records, and remembers exactly what it emitted so a
//! later change removes precisely those records. Indexes carry a version; a
//! mismatch with what is stored triggers a full rebuild on open.
//!
//! # Quick Start
//!
//! ```
//! use mdindex::{Indexer, IndexerConfig, SourceChange};
//! use serde_json::json;
//!
//! let config = IndexerConfig { owner_uid: "u1".into(), ..IndexerConfig::default() };
//! let (indexer, report) = Indexer::ephemeral(&config)?;
//! assert!(report.all_ready());
//!
//! indexer.apply(&[SourceChange::Put {
//!     id: "42".into(),
//!     document: json!({
//!         "path": "/Photos/cat.jpg",
//!         "is_dir": false,
//!         "rev": "8cdc23804a74",
//!         "modified": "Fri, 23 Jan 2015 22:15:17 +0000",
//!         "modifier": null,
//!     }),
//! }])?;
//!
//! assert_eq!(indexer.search("jpg", "ca")?.len(), 1);
//! assert_eq!(indexer.recents(10)?.len(), 1);
//! # Ok::<(), mdindex::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `mdindex-core`: error type, store traits, write batches, key space
//! - `mdindex-storage`: in-memory store and bounded scans
//! - `mdindex-engine`: iterator, index contract, shipped indexes, registry

mod indexer;

pub use indexer::Indexer;

pub use mdindex_core::{
    keyspace, Document, Error, KeyStore, Result, StoreCursor, StoreSnapshot, WriteBatch,
};
pub use mdindex_engine::*;
pub use mdindex_storage::MemoryStore;
