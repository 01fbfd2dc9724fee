//! WriteBatch: ordered puts and deletes committed atomically
//!
//! Every change the engine makes (source records, index records, meta
//! records) is staged in one batch and committed with a single
//! [`KeyStore::write`](crate::KeyStore::write). Operations keep their order;
//! the last operation staged for a key decides its final state.
//!
//! The batch also answers "what has this batch already staged for key K",
//! which lets code running inside an update scope read its own writes.

use std::collections::BTreeMap;

/// A single staged operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Create or overwrite `key`
    Put {
        /// Full store key
        key: Vec<u8>,
        /// Value bytes
        value: Vec<u8>,
    },
    /// Remove `key` if present
    Delete {
        /// Full store key
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Key this operation touches
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// Ordered set of put/delete operations applied atomically
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
    /// Position in `ops` of the most recent operation per key
    latest: BTreeMap<Vec<u8>, usize>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put of `value` under `key`
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        self.latest.insert(key.clone(), self.ops.len());
        self.ops.push(BatchOp::Put {
            key,
            value: value.into(),
        });
    }

    /// Stage a delete of `key`
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        let key = key.into();
        self.latest.insert(key.clone(), self.ops.len());
        self.ops.push(BatchOp::Delete { key });
    }

    /// What this batch will leave behind for `key`
    ///
    /// - `None`: the batch does not touch `key`
    /// - `Some(None)`: the last staged operation deletes `key`
    /// - `Some(Some(value))`: the last staged operation puts `value`
    pub fn pending(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        let idx = *self.latest.get(key)?;
        match &self.ops[idx] {
            BatchOp::Put { value, .. } => Some(Some(value.as_slice())),
            BatchOp::Delete { .. } => Some(None),
        }
    }

    /// Number of staged operations (not distinct keys)
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing has been staged
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged operations in the order they will be applied
    pub fn iter(&self) -> std::slice::Iter<'_, BatchOp> {
        self.ops.iter()
    }

    /// Drop every staged operation
    pub fn clear(&mut self) {
        self.ops.clear();
        self.latest.clear();
    }
}

impl<'a> IntoIterator for &'a WriteBatch {
    type Item = &'a BatchOp;
    type IntoIter = std::slice::Iter<'a, BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
