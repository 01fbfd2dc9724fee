//! MemorySnapshot and MemoryCursor
//!
//! `MemoryStore` keeps its data in an `Arc<BTreeMap>`. A snapshot is just
//! another handle on the map as it was at capture time; the writer clones the
//! map before mutating it while snapshots are outstanding (copy-on-write).
//!
//! # Design Notes
//!
//! - **O(1) capture**: taking a snapshot clones an `Arc`, not the map
//! - **Immutable**: once created, the snapshot never changes
//! - **Release on drop**: the store counts live snapshots; the count drops
//!   exactly when the snapshot value is dropped
//! - **Cursors own their view**: a cursor holds its own `Arc` of the map, so
//!   it never borrows from the snapshot or store that produced it

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mdindex_core::{Result, StoreCursor, StoreSnapshot};

/// Ordered table shared between the store, its snapshots and cursors
pub(crate) type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Point-in-time view of a `MemoryStore`
///
/// # Example
///
/// ```ignore
/// let store = MemoryStore::new();
/// // ... write some data ...
/// let snapshot = store.snapshot();
///
/// // Writes after snapshot creation are not visible
/// store.write(&batch)?;
/// assert!(snapshot.get(b"new-key")?.is_none());
/// ```
#[derive(Debug)]
pub struct MemorySnapshot {
    /// Commit sequence of the store when the snapshot was taken
    sequence: u64,
    table: Arc<Table>,
    /// Live-snapshot counter of the owning store
    live: Arc<AtomicUsize>,
}

impl MemorySnapshot {
    pub(crate) fn new(sequence: u64, table: Arc<Table>, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            sequence,
            table,
            live,
        }
    }

    /// Commit sequence at which the snapshot was taken
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of records visible in the snapshot
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the snapshot has no records
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Drop for MemorySnapshot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StoreSnapshot for MemorySnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.table.get(key).cloned())
    }

    fn cursor(&self) -> Box<dyn StoreCursor> {
        Box::new(MemoryCursor::new(Arc::clone(&self.table)))
    }
}

/// Cursor over a fixed version of a `MemoryStore` table
///
/// Every step is an O(log n) range lookup relative to the current key, so the
/// cursor stays correct without holding a borrow into the map.
#[derive(Debug)]
pub struct MemoryCursor {
    table: Arc<Table>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MemoryCursor {
    pub(crate) fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            current: None,
        }
    }

    fn position<'a>(&mut self, entry: Option<(&'a Vec<u8>, &'a Vec<u8>)>) {
        self.current = entry.map(|(k, v)| (k.clone(), v.clone()));
    }
}

impl StoreCursor for MemoryCursor {
    fn seek_to_first(&mut self) {
        let table = Arc::clone(&self.table);
        self.position(table.iter().next());
    }

    fn seek_to_last(&mut self) {
        let table = Arc::clone(&self.table);
        self.position(table.iter().next_back());
    }

    fn seek(&mut self, target: &[u8]) {
        let table = Arc::clone(&self.table);
        let entry = table
            .range::<[u8], _>((Bound::Included(target), Bound::Unbounded))
            .next();
        self.position(entry);
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or_default()
    }

    fn next(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let table = Arc::clone(&self.table);
        let entry = table
            .range::<[u8], _>((Bound::Excluded(key.as_slice()), Bound::Unbounded))
            .next();
        self.position(entry);
    }

    fn prev(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let table = Arc::clone(&self.table);
        let entry = table
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key.as_slice())))
            .next_back();
        self.position(entry);
    }
}
