//! Index maintenance engine for mdindex
//!
//! This crate keeps secondary indexes in step with the source records of a
//! synced metadata cache:
//! - Iterator: snapshot-bound range scans (`RangeIterator`)
//! - Index: the versioned map/emit contract, update scopes and rebuilds
//! - Registry: the ordered set of indexes and the version check on open
//! - Search / Recents: the two shipped indexes
//! - Source: committing source changes together with their index updates
//! - Changes: prefix-scoped notification of committed batches
//! - Config: `mdindex.toml`
//!
//! The engine is synchronous and assumes a single writer. Readers may run
//! concurrently with it; every read goes through a snapshot.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod changes;
pub mod config;
pub mod index;
pub mod iterator;
pub mod recents;
pub mod registry;
pub mod search;
pub mod source;

pub use changes::{ChangeKind, ChangeNotifier, DataChange, ListenerId};
pub use config::{IndexerConfig, SearchConfig, CONFIG_FILE_NAME};
pub use index::{
    DatasetOwner, Index, IndexContext, IndexHandle, RebuildStats, ReverseLookup, UpdateScope,
};
pub use iterator::{Entries, RangeIterator};
pub use recents::{sortable_timestamp, RecentsIndex};
pub use registry::{IndexLoad, IndexRegistry, LoadReport, KNOWN_INDEXES};
pub use search::SearchIndex;
pub use source::{apply_source_changes, SourceChange};
