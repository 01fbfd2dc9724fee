//! RangeIterator: snapshot-bound cursor over one prefix range
//!
//! A `RangeIterator` owns a store snapshot and a cursor bound to the
//! half-open range `[prefix, prefix + 0xFF)`. Everything it reads, including
//! the source records it dereferences through [`RangeIterator::entry_value`],
//! comes from that one snapshot, so a scan is time-consistent with itself no
//! matter what the writer commits meanwhile.
//!
//! The snapshot is released exactly once, when the iterator is dropped.

use std::fmt;

use mdindex_core::keyspace::{source_key, terminal};
use mdindex_core::{Document, KeyStore, Result, StoreCursor, StoreSnapshot};

/// Cursor over the records of one key prefix, reading from a private snapshot
pub struct RangeIterator {
    // Declared before `snapshot` so the cursor is dropped first
    cursor: Box<dyn StoreCursor>,
    snapshot: Box<dyn StoreSnapshot>,
    prefix: Vec<u8>,
    terminal: Vec<u8>,
}

impl RangeIterator {
    /// Open a snapshot of `store` and bind a cursor to `prefix`
    ///
    /// The iterator starts unpositioned; call one of the seek methods first.
    pub fn new(store: &dyn KeyStore, prefix: impl Into<Vec<u8>>) -> Self {
        let prefix = prefix.into();
        let snapshot = store.snapshot();
        let cursor = snapshot.cursor();
        Self {
            cursor,
            snapshot,
            terminal: terminal(&prefix),
            prefix,
        }
    }

    /// Prefix this iterator is bound to
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Position at the first record of the range
    pub fn seek_to_first(&mut self) {
        self.cursor.seek(&self.prefix);
    }

    /// Position at the last record of the range
    ///
    /// Seeks to the terminal bound and steps back once. If nothing sorts at or
    /// after the terminal the cursor is placed on the last key of the whole
    /// snapshot instead, which is the same "greatest key below the terminal".
    /// An empty range leaves the iterator invalid.
    ///
    /// No in-range key can equal the terminal bound (see `mdindex_core::keyspace`);
    /// that is assumed here, not re-checked.
    pub fn seek_to_last(&mut self) {
        self.cursor.seek(&self.terminal);
        if self.cursor.valid() {
            self.cursor.prev();
        } else {
            self.cursor.seek_to_last();
        }
    }

    /// Position at the first record whose suffix is >= `suffix`
    pub fn seek_to_key(&mut self, suffix: &str) {
        let mut target = Vec::with_capacity(self.prefix.len() + suffix.len());
        target.extend_from_slice(&self.prefix);
        target.extend_from_slice(suffix.as_bytes());
        self.cursor.seek(&target);
    }

    /// Whether the iterator is on a record inside the range
    ///
    /// The prefix check and the terminal check agree whenever the terminal is
    /// built correctly; both are kept so a key containing the reserved byte
    /// cannot walk the iterator into a neighbouring range.
    pub fn valid(&self) -> bool {
        if !self.cursor.valid() {
            return false;
        }
        let key = self.cursor.key();
        key.starts_with(&self.prefix) && key < self.terminal.as_slice()
    }

    /// Current key with the prefix stripped
    pub fn key(&self) -> &[u8] {
        let key = self.cursor.key();
        key.get(self.prefix.len()..).unwrap_or_default()
    }

    /// Current key suffix as UTF-8, if it is valid UTF-8
    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(self.key()).ok()
    }

    /// Owned copy of the current value
    pub fn value(&self) -> Vec<u8> {
        self.cursor.value().to_vec()
    }

    /// Borrowed current value, valid until the iterator moves
    pub fn data_value(&self) -> &[u8] {
        self.cursor.value()
    }

    /// Source record named by the current value, as of this iterator's snapshot
    ///
    /// The current value is taken to be a source record id. Returns `None`
    /// when that record did not exist when the snapshot was taken.
    pub fn entry_value(&self) -> Result<Option<Vec<u8>>> {
        let id = String::from_utf8_lossy(self.cursor.value());
        self.source_value(&id)
    }

    /// Source record `id` as of this iterator's snapshot
    pub fn source_value(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.snapshot.get(&source_key(id))
    }

    /// [`entry_value`](Self::entry_value) parsed as a JSON document
    pub fn entry_document(&self) -> Result<Option<Document>> {
        match self.entry_value()? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Step forward
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        self.cursor.next();
    }

    /// Step backward
    pub fn prev(&mut self) {
        self.cursor.prev();
    }

    /// Iterate `(suffix, value)` pairs forward from the current position
    pub fn entries(&mut self) -> Entries<'_> {
        Entries { iter: self }
    }
}

impl fmt::Debug for RangeIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeIterator")
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .field("valid", &self.valid())
            .finish()
    }
}

/// Forward adapter returned by [`RangeIterator::entries`]
#[derive(Debug)]
pub struct Entries<'a> {
    iter: &'a mut RangeIterator,
}

impl Iterator for Entries<'_> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.iter.valid() {
            return None;
        }
        let item = (self.iter.key().to_vec(), self.iter.value());
        self.iter.next();
        Some(item)
    }
}
