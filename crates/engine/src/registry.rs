//! The set of indexes maintained over a dataset
//!
//! The registry is built once at startup and passed by reference to
//! everything that updates or queries indexes. Order is fixed at
//! registration: changes are applied to indexes in that order, and the
//! version check visits them in that order.

use std::sync::Arc;

use tracing::{info, warn};

use mdindex_core::{Error, KeyStore, Result};

use crate::changes::ChangeNotifier;
use crate::config::IndexerConfig;
use crate::index::{DatasetOwner, Index, IndexHandle, RebuildStats};
use crate::recents::RecentsIndex;
use crate::search::SearchIndex;

/// Names of the indexes this crate ships, in default registration order
pub const KNOWN_INDEXES: &[&str] = &[SearchIndex::NAME, RecentsIndex::NAME];

/// What [`IndexRegistry::open`] did with one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLoad {
    /// Stored version matched; nothing was written
    UpToDate,
    /// Version differed and the index was rebuilt
    Rebuilt(RebuildStats),
    /// Version differed and the rebuild did not commit; the index is unchanged
    RebuildFailed(String),
}

/// Per-index outcome of [`IndexRegistry::open`], in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// `(index name, outcome)` pairs
    pub outcomes: Vec<(String, IndexLoad)>,
}

impl LoadReport {
    /// Outcome for the index called `name`
    pub fn get(&self, name: &str) -> Option<&IndexLoad> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, load)| load)
    }

    /// Names of indexes whose rebuild failed
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, load)| matches!(load, IndexLoad::RebuildFailed(_)))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Whether every index is at its compiled-in version
    pub fn all_ready(&self) -> bool {
        self.failed().is_empty()
    }
}

/// Ordered collection of index handles
#[derive(Debug, Default)]
pub struct IndexRegistry {
    handles: Vec<Arc<IndexHandle>>,
}

impl IndexRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every shipped index, search first
    pub fn with_defaults() -> Self {
        Self {
            handles: vec![
                Arc::new(IndexHandle::new(Arc::new(SearchIndex::new()))),
                Arc::new(IndexHandle::new(Arc::new(RecentsIndex::new()))),
            ],
        }
    }

    /// Registry with the indexes `config` enables, in the listed order
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        config.validate()?;
        let mut registry = Self::new();
        for name in &config.indexes {
            match name.as_str() {
                SearchIndex::NAME => registry.register(Arc::new(SearchIndex::with_default_limit(
                    config.search.default_limit,
                )))?,
                RecentsIndex::NAME => registry.register(Arc::new(RecentsIndex::new()))?,
                other => {
                    return Err(Error::InvalidConfig(format!("Unknown index '{other}'")));
                }
            }
        }
        Ok(registry)
    }

    /// Append an index; names must be unique
    pub fn register<I: Index + 'static>(&mut self, index: Arc<I>) -> Result<()> {
        let handle = IndexHandle::new(index);
        if self.get(handle.name()).is_some() {
            return Err(Error::InvalidConfig(format!(
                "Index '{}' is already registered",
                handle.name()
            )));
        }
        self.handles.push(Arc::new(handle));
        Ok(())
    }

    /// Handle of the index called `name`
    pub fn get(&self, name: &str) -> Option<&Arc<IndexHandle>> {
        self.handles.iter().find(|h| h.name() == name)
    }

    /// The first registered index of concrete type `T`
    pub fn get_typed<T: Index + 'static>(&self) -> Option<Arc<T>> {
        self.handles.iter().find_map(|h| h.downcast::<T>())
    }

    /// Handles in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexHandle>> {
        self.handles.iter()
    }

    /// Registered index names in order
    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no index is registered
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Bring every index to its compiled-in version
    ///
    /// Indexes whose stored version differs are rebuilt one at a time. A
    /// failed rebuild is logged and reported but does not stop the others.
    /// Only a failure to read a stored version is returned as an error.
    /// Each committed rebuild is passed to `notifier`, if one is given.
    pub fn open(
        &self,
        store: &dyn KeyStore,
        owner: &DatasetOwner,
        notifier: Option<&ChangeNotifier>,
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for handle in &self.handles {
            let stored = handle.read_version(store)?;
            let load = if stored.as_deref() == Some(handle.version()) {
                IndexLoad::UpToDate
            } else {
                info!(
                    target: "mdindex::registry",
                    index = handle.name(),
                    stored = stored.as_deref().unwrap_or("<none>"),
                    compiled = handle.version(),
                    "Index version changed, rebuilding"
                );
                match handle.rebuild(owner, store, notifier) {
                    Ok(stats) => IndexLoad::Rebuilt(stats),
                    Err(e) => {
                        warn!(target: "mdindex::registry", index = handle.name(), error = %e, "Index left at stored version");
                        IndexLoad::RebuildFailed(e.to_string())
                    }
                }
            };
            report.outcomes.push((handle.name().to_string(), load));
        }
        Ok(report)
    }
}
