//! Update scopes: the bracket every index write happens in

use std::ops::ControlFlow;
use std::sync::atomic::Ordering;

use tracing::warn;

use mdindex_core::keyspace::terminal;
use mdindex_core::{Document, KeyStore, Result, WriteBatch};
use mdindex_storage::for_each_in_range;

use super::{DatasetOwner, IndexContext, IndexHandle, ReverseLookup};

/// An open update on one index
///
/// Created by [`IndexHandle::begin_update`]; closed by [`UpdateScope::end`]
/// or by dropping it. All writes land in the caller's batch, nothing is
/// committed here.
pub struct UpdateScope<'a> {
    handle: &'a IndexHandle,
    cx: IndexContext<'a>,
}

impl<'a> UpdateScope<'a> {
    pub(crate) fn begin(
        handle: &'a IndexHandle,
        owner: &'a DatasetOwner,
        store: &'a dyn KeyStore,
        batch: &'a mut WriteBatch,
    ) -> Self {
        if handle.updating.swap(true, Ordering::SeqCst) {
            panic!(
                "update scope already open for index \"{}\"; updates are non-reentrant",
                handle.name()
            );
        }
        Self {
            handle,
            cx: IndexContext::new(&handle.keys, owner, store, batch),
        }
    }

    /// Run the index's `init()`; only meaningful right after clearing it
    ///
    /// Also writes an empty record at the index's terminal key, so a seek to
    /// the terminal always lands on a key inside the store.
    pub fn init(&mut self) -> Result<()> {
        let marker = self.handle.keys.terminal();
        self.cx.batch().put(marker, Vec::new());
        self.cx.reset_emitted();
        self.handle.index.init(&mut self.cx)?;
        // init() output is not attributed to any source record
        self.cx.reset_emitted();
        Ok(())
    }

    /// Map source record `id` and record what it emitted
    ///
    /// If `map()` emitted anything, exactly that set replaces the record's
    /// reverse lookup. If it emitted nothing, no reverse lookup is written and
    /// any existing one is left as it is.
    ///
    /// The previous reverse lookup is not consulted: when a record's emitted
    /// set changes from A to B, keys in A but not in B stay behind. Callers
    /// that replace a record must call [`remove`](Self::remove) first.
    pub fn put(&mut self, id: &str, doc: &Document) -> Result<()> {
        self.cx.reset_emitted();
        self.handle.index.map(&mut self.cx, id, doc)?;

        let emitted = self.cx.take_emitted();
        if !emitted.is_empty() {
            let bytes = serde_json::to_vec(&emitted)?;
            let key = self.handle.keys.reverse_lookup_key(id);
            self.cx.batch().put(key, bytes);
        }
        Ok(())
    }

    /// Delete every record source record `id` last emitted, and its reverse lookup
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let keys = &self.handle.keys;
        let lookup_key = keys.reverse_lookup_key(id);

        if let Some(bytes) = self.cx.read(&lookup_key)? {
            match serde_json::from_slice::<ReverseLookup>(&bytes) {
                Ok(lookup) => {
                    let batch = self.cx.batch();
                    for suffix in &lookup.keys {
                        batch.delete(keys.data_key(suffix));
                    }
                    for meta in &lookup.meta {
                        batch.delete(keys.meta_key(meta));
                    }
                }
                Err(e) => {
                    warn!(
                        target: "mdindex::index",
                        index = keys.name(),
                        id,
                        error = %e,
                        "Unreadable reverse lookup, dropping it"
                    );
                }
            }
        }

        self.cx.batch().delete(lookup_key);
        Ok(())
    }

    /// Stage deletion of every record in the index namespace, data and meta
    pub(crate) fn clear(&mut self) -> usize {
        let store = self.cx.store();
        let data_prefix = self.handle.keys.prefix().to_vec();
        let meta_prefix = terminal(&data_prefix);

        let mut doomed = Vec::new();
        for prefix in [&data_prefix, &meta_prefix] {
            for_each_in_range(store.cursor(), prefix, |key, _| {
                doomed.push(key.to_vec());
                ControlFlow::Continue(())
            });
        }

        let count = doomed.len();
        let batch = self.cx.batch();
        for key in doomed {
            batch.delete(key);
        }
        count
    }

    /// Stage the compiled-in version as the stored version
    pub(crate) fn write_version(&mut self) {
        let key = self.handle.keys.version_key();
        let version = self.handle.version().as_bytes().to_vec();
        self.cx.batch().put(key, version);
    }

    /// Close the scope
    pub fn end(self) {}
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.handle.updating.store(false, Ordering::SeqCst);
    }
}
