//! Storage layer for mdindex
//!
//! This crate provides:
//! - MemoryStore: BTreeMap-based `KeyStore` with copy-on-write snapshots
//! - MemorySnapshot / MemoryCursor: the snapshot and cursor types it hands out
//! - Scan utilities: bounded prefix scans and whole-store deletion
//!
//! On device the engine runs against an embedded LSM store; `MemoryStore`
//! implements the same contract for tests, tools and ephemeral caches.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod scan;
pub mod snapshot;

pub use memory::MemoryStore;
pub use scan::{delete_all, for_each_in_range};
pub use snapshot::{MemoryCursor, MemorySnapshot};
