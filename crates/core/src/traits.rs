//! Core traits for the ordered key-value store
//!
//! The index engine does not own a storage engine; it is written against
//! these traits so that any ordered store with snapshots and atomic batches
//! can back it (an embedded LSM store on device, `MemoryStore` in tests).
//!
//! The contract:
//! - point reads of the live view
//! - atomic commit of a [`WriteBatch`]
//! - ascending byte-ordered cursors
//! - immutable point-in-time snapshots, released when dropped

use std::sync::Arc;

use crate::batch::WriteBatch;
use crate::error::Result;

/// Ordered key-value store backing source records, index records and meta records.
///
/// Thread safety: implementations must tolerate concurrent readers and
/// snapshot holders alongside the single writer (requires Send + Sync).
pub trait KeyStore: Send + Sync {
    /// Read the current value for `key` from the live view
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Commit every operation in `batch` atomically
    ///
    /// Either all puts and deletes become visible or none do. Operations are
    /// applied in batch order, so a later operation on a key wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit did not apply.
    fn write(&self, batch: &WriteBatch) -> Result<()>;

    /// Open an ascending cursor over the live view
    ///
    /// The cursor is unpositioned (invalid) until one of its seek methods is called.
    fn cursor(&self) -> Box<dyn StoreCursor>;

    /// Capture an immutable point-in-time view of the store
    ///
    /// The snapshot is released when the returned value is dropped.
    fn snapshot(&self) -> Box<dyn StoreSnapshot>;
}

impl<S: KeyStore + ?Sized> KeyStore for Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn write(&self, batch: &WriteBatch) -> Result<()> {
        (**self).write(batch)
    }

    fn cursor(&self) -> Box<dyn StoreCursor> {
        (**self).cursor()
    }

    fn snapshot(&self) -> Box<dyn StoreSnapshot> {
        (**self).snapshot()
    }
}

/// Immutable point-in-time view of a [`KeyStore`]
///
/// Commits made after the snapshot was taken are never observed through it.
pub trait StoreSnapshot: Send + Sync {
    /// Read `key` as it was when the snapshot was taken
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Open an ascending cursor bound to this snapshot
    fn cursor(&self) -> Box<dyn StoreCursor>;
}

/// Bidirectional cursor over keys in ascending byte order
///
/// `key()` and `value()` are only meaningful while `valid()` is true; an
/// invalid cursor reports empty slices.
pub trait StoreCursor: Send {
    /// Position at the first key in the view
    fn seek_to_first(&mut self);

    /// Position at the last key in the view
    fn seek_to_last(&mut self);

    /// Position at the first key >= `target`
    fn seek(&mut self, target: &[u8]);

    /// Whether the cursor is positioned on an entry
    fn valid(&self) -> bool;

    /// Key at the current position
    fn key(&self) -> &[u8];

    /// Value at the current position
    fn value(&self) -> &[u8];

    /// Step to the next key; becomes invalid past the last key
    fn next(&mut self);

    /// Step to the previous key; becomes invalid before the first key
    fn prev(&mut self);
}
