//! MemoryStore: ordered in-memory `KeyStore`
//!
//! This module implements the `KeyStore` trait using:
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for byte-ordered keys
//! - `Arc` around the map so snapshots are O(1) handles
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` commit sequence
//!
//! # Design Notes
//!
//! - **Copy-on-write**: a commit mutates the map in place when no snapshot or
//!   cursor shares it, and clones it first otherwise (`Arc::make_mut`)
//! - **Atomic batches**: the whole batch is applied under one write lock, so
//!   no reader or snapshot can observe a partial commit
//! - **Live cursors**: a cursor over the live view pins the map as of cursor
//!   creation, which is what an LSM iterator without an explicit snapshot does

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use mdindex_core::{BatchOp, KeyStore, Result, StoreCursor, StoreSnapshot, WriteBatch};

use crate::snapshot::{MemoryCursor, MemorySnapshot, Table};

/// In-memory ordered key-value store with snapshots
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Arc<Table>>,
    /// Number of committed batches
    sequence: AtomicU64,
    /// Snapshots handed out and not yet dropped
    live_snapshots: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the live view
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the live view holds no records
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of batches committed so far
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of snapshots that have been taken and not yet released
    pub fn live_snapshots(&self) -> usize {
        self.live_snapshots.load(Ordering::SeqCst)
    }

    /// Take a typed snapshot (same as [`KeyStore::snapshot`], without boxing)
    pub fn create_snapshot(&self) -> MemorySnapshot {
        // Read the sequence under the lock so it matches the captured table
        let data = self.data.read();
        let sequence = self.sequence.load(Ordering::SeqCst);
        MemorySnapshot::new(sequence, Arc::clone(&*data), Arc::clone(&self.live_snapshots))
    }

    /// All keys in the live view, in order
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.data.read().keys().cloned().collect()
    }
}

impl KeyStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        // Hold the write lock for the entire batch
        let mut data = self.data.write();
        let table = Arc::make_mut(&mut *data);

        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    table.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    table.remove(key);
                }
            }
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(target: "mdindex::store", ops = batch.len(), sequence, "Batch committed");
        Ok(())
    }

    fn cursor(&self) -> Box<dyn StoreCursor> {
        Box::new(MemoryCursor::new(Arc::clone(&*self.data.read())))
    }

    fn snapshot(&self) -> Box<dyn StoreSnapshot> {
        Box::new(self.create_snapshot())
    }
}
