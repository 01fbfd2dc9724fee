//! Runtime services available to `Index::init` and `Index::map`

use std::collections::BTreeSet;

use mdindex_core::{IndexKeys, KeyStore, Result, WriteBatch};

use super::{DatasetOwner, ReverseLookup};

/// Services an index uses while mapping source records
///
/// Only exists inside an open [`UpdateScope`](super::UpdateScope), so none
/// of these calls can happen outside an update. Writes are staged in the
/// scope's batch; reads see the live store overlaid with whatever the batch
/// has already staged.
pub struct IndexContext<'a> {
    keys: &'a IndexKeys,
    owner: &'a DatasetOwner,
    store: &'a dyn KeyStore,
    batch: &'a mut WriteBatch,
    /// Data suffixes emitted during the current `map()` call
    emitted: BTreeSet<String>,
    /// Meta keys written during the current `map()` call
    emitted_meta: BTreeSet<String>,
}

impl<'a> IndexContext<'a> {
    pub(crate) fn new(
        keys: &'a IndexKeys,
        owner: &'a DatasetOwner,
        store: &'a dyn KeyStore,
        batch: &'a mut WriteBatch,
    ) -> Self {
        Self {
            keys,
            owner,
            store,
            batch,
            emitted: BTreeSet::new(),
            emitted_meta: BTreeSet::new(),
        }
    }

    /// Create or overwrite the index record `key`
    pub fn emit(&mut self, key: &str, value: impl AsRef<[u8]>) {
        self.batch.put(self.keys.data_key(key), value.as_ref());
        self.emitted.insert(key.to_string());
    }

    /// Delete the index record `key`
    pub fn remove(&mut self, key: &str) {
        self.batch.delete(self.keys.data_key(key));
        self.emitted.remove(key);
    }

    /// Read the index record `key`
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.read(&self.keys.data_key(key))
    }

    /// Read the meta record `key`
    ///
    /// Meta records are never visited by iterators over the index.
    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.read(&self.keys.meta_key(key))
    }

    /// Create or overwrite the meta record `key`
    ///
    /// The key is remembered with the current source record, so removing the
    /// record later also removes this meta record.
    pub fn put_meta(&mut self, key: &str, value: impl AsRef<[u8]>) {
        self.batch.put(self.keys.meta_key(key), value.as_ref());
        self.emitted_meta.insert(key.to_string());
    }

    /// Delete the meta record `key`
    pub fn remove_meta(&mut self, key: &str) {
        self.batch.delete(self.keys.meta_key(key));
        self.emitted_meta.remove(key);
    }

    /// Owner of the dataset being indexed
    pub fn owner(&self) -> &DatasetOwner {
        self.owner
    }

    /// Name of the index being updated
    pub fn index_name(&self) -> &str {
        self.keys.name()
    }

    pub(crate) fn store(&self) -> &dyn KeyStore {
        self.store
    }

    pub(crate) fn batch(&mut self) -> &mut WriteBatch {
        &mut *self.batch
    }

    /// Read a full key, preferring what the batch has staged
    pub(crate) fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.batch.pending(key) {
            Some(staged) => Ok(staged.map(<[u8]>::to_vec)),
            None => self.store.get(key),
        }
    }

    /// Forget what the previous `map()` call touched
    pub(crate) fn reset_emitted(&mut self) {
        self.emitted.clear();
        self.emitted_meta.clear();
    }

    /// Hand over what the current `map()` call touched
    pub(crate) fn take_emitted(&mut self) -> ReverseLookup {
        ReverseLookup {
            keys: std::mem::take(&mut self.emitted),
            meta: std::mem::take(&mut self.emitted_meta),
        }
    }
}
