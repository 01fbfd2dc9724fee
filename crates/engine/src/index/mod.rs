//! Versioned, incremental secondary indexes
//!
//! An index is a materialized view over the source records: for every source
//! record, [`Index::map`] emits zero or more index records through an
//! [`IndexContext`]. The framework remembers which keys each source record
//! emitted (its *reverse lookup*), so a later removal deletes exactly those
//! records without re-running `map` or diffing old against new output.
//!
//! ## Lifecycle
//!
//! 1. [`IndexHandle::needs_rebuild`] compares the compiled-in
//!    [`Index::version`] with the version stored in the index's meta range
//! 2. On mismatch, [`IndexHandle::rebuild`] clears the index, runs
//!    [`Index::init`], and maps every source record in one batch
//! 3. Otherwise the sync layer feeds changes through an [`UpdateScope`]
//!
//! ## Update scopes
//!
//! ```text
//! begin_update(owner, store, batch)
//!     init()?                       (rebuild only)
//!     { put(id, doc) | remove(id) }*
//! end()
//! ```
//!
//! Scopes are non-reentrant: opening a second scope on an index while one is
//! open is a programming error and panics.

mod context;
mod rebuild;
mod scope;

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mdindex_core::{Document, Error, IndexKeys, KeyStore, Result, WriteBatch};

use crate::iterator::RangeIterator;

pub use context::IndexContext;
pub use rebuild::RebuildStats;
pub use scope::UpdateScope;

/// A versioned secondary index over source records
///
/// Implementations must be deterministic: mapping the same document for the
/// same id must emit the same set of keys, otherwise the reverse lookup no
/// longer describes what is on disk.
pub trait Index: Send + Sync {
    /// Name of the index; its records live under `index:<name>:`
    fn name(&self) -> &str;

    /// Identity of the index implementation
    ///
    /// Compared against the stored version when the index is loaded. Any
    /// change triggers a full rebuild, so bump it whenever `map` changes
    /// what it emits.
    fn version(&self) -> &str;

    /// Prepare a freshly cleared index; runs only during a rebuild, before any `map`
    fn init(&self, cx: &mut IndexContext<'_>) -> Result<()> {
        let _ = cx;
        Ok(())
    }

    /// Emit index records for one source record
    fn map(&self, cx: &mut IndexContext<'_>, id: &str, doc: &Document) -> Result<()>;
}

/// The account whose dataset is being indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOwner {
    uid: String,
}

impl DatasetOwner {
    /// Owner identified by `uid`
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }

    /// User id of the owner
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

/// Keys written by one source record's latest `map()` call
///
/// Stored as JSON under `index:<name>:\xff_keys_:<id>`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseLookup {
    /// Suffixes of emitted index records
    pub keys: BTreeSet<String>,
    /// Index-private meta keys written through `put_meta`
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub meta: BTreeSet<String>,
}

impl ReverseLookup {
    /// Whether the `map()` call touched nothing
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.meta.is_empty()
    }
}

/// Runtime wrapper around one registered [`Index`]
///
/// Owns the index's key layout and the flag that keeps update scopes
/// non-reentrant.
pub struct IndexHandle {
    index: Arc<dyn Index>,
    any: Arc<dyn Any + Send + Sync>,
    keys: IndexKeys,
    updating: AtomicBool,
}

impl IndexHandle {
    /// Wrap a concrete index
    pub fn new<I: Index + 'static>(index: Arc<I>) -> Self {
        let keys = IndexKeys::new(index.name());
        Self {
            any: index.clone() as Arc<dyn Any + Send + Sync>,
            index,
            keys,
            updating: AtomicBool::new(false),
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        self.keys.name()
    }

    /// Compiled-in version of the index
    pub fn version(&self) -> &str {
        self.index.version()
    }

    /// Key layout of the index
    pub fn keys(&self) -> &IndexKeys {
        &self.keys
    }

    /// The wrapped index
    pub fn index(&self) -> &Arc<dyn Index> {
        &self.index
    }

    /// The wrapped index as its concrete type, if it is a `T`
    pub fn downcast<T: Index + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.any).downcast::<T>().ok()
    }

    /// Version stored in the index's meta range, if any
    pub fn read_version(&self, store: &dyn KeyStore) -> Result<Option<String>> {
        Ok(store
            .get(&self.keys.version_key())?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Whether the stored version differs from the compiled-in one
    pub fn needs_rebuild(&self, store: &dyn KeyStore) -> Result<bool> {
        Ok(self.read_version(store)?.as_deref() != Some(self.version()))
    }

    /// Reverse lookup stored for source record `id`
    ///
    /// # Errors
    ///
    /// [`Error::Corruption`] if the stored record is not a reverse lookup.
    pub fn reverse_lookup(&self, store: &dyn KeyStore, id: &str) -> Result<Option<ReverseLookup>> {
        let Some(bytes) = store.get(&self.keys.reverse_lookup_key(id))? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::Corruption(format!(
                "reverse lookup for \"{id}\" in index \"{}\": {e}",
                self.name()
            ))
        })
    }

    /// Open an update scope staging into `batch`
    ///
    /// # Panics
    ///
    /// Panics if a scope is already open on this index.
    pub fn begin_update<'a>(
        &'a self,
        owner: &'a DatasetOwner,
        store: &'a dyn KeyStore,
        batch: &'a mut WriteBatch,
    ) -> UpdateScope<'a> {
        UpdateScope::begin(self, owner, store, batch)
    }

    /// Iterator over this index's records under a fresh snapshot
    pub fn iterator(&self, store: &dyn KeyStore) -> RangeIterator {
        RangeIterator::new(store, self.keys.prefix())
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}
