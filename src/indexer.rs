//! `Indexer`: one dataset, its indexes and its change listeners

use mdindex_core::{Document, Error, KeyStore, Result};
use mdindex_engine::{
    apply_source_changes, ChangeNotifier, DatasetOwner, IndexRegistry, IndexerConfig, LoadReport,
    RecentsIndex, SearchIndex, SourceChange,
};
use mdindex_storage::MemoryStore;

/// High-level handle over a store and the indexes maintained in it
///
/// # Example
///
/// ```
/// use mdindex::{Indexer, IndexerConfig, SourceChange};
/// use serde_json::json;
///
/// let config = IndexerConfig { owner_uid: "u1".into(), ..IndexerConfig::default() };
/// let (indexer, _report) = Indexer::ephemeral(&config)?;
///
/// indexer.apply(&[SourceChange::Put {
///     id: "1".into(),
///     document: json!({"path": "/Notes/todo.txt", "is_dir": false}),
/// }])?;
///
/// assert_eq!(indexer.search("", "todo")?.len(), 1);
/// # Ok::<(), mdindex::Error>(())
/// ```
#[derive(Debug)]
pub struct Indexer<S: KeyStore> {
    store: S,
    registry: IndexRegistry,
    owner: DatasetOwner,
    notifier: ChangeNotifier,
}

impl Indexer<MemoryStore> {
    /// Indexer over a fresh in-memory store
    pub fn ephemeral(config: &IndexerConfig) -> Result<(Self, LoadReport)> {
        Self::open(MemoryStore::new(), config)
    }
}

impl<S: KeyStore> Indexer<S> {
    /// Build the configured indexes over `store` and bring them up to date
    ///
    /// Indexes whose rebuild fails are reported in the returned
    /// [`LoadReport`]; they keep serving what they held before.
    pub fn open(store: S, config: &IndexerConfig) -> Result<(Self, LoadReport)> {
        Self::open_with_notifier(store, config, ChangeNotifier::new())
    }

    /// Like [`open`](Self::open), with listeners already registered
    ///
    /// Listeners on `notifier` hear about the rebuilds done while opening as
    /// well as every later [`apply`](Self::apply).
    pub fn open_with_notifier(
        store: S,
        config: &IndexerConfig,
        notifier: ChangeNotifier,
    ) -> Result<(Self, LoadReport)> {
        let registry = IndexRegistry::from_config(config)?;
        let owner = config.owner();
        let report = registry.open(&store, &owner, Some(&notifier))?;
        Ok((
            Self {
                store,
                registry,
                owner,
                notifier,
            },
            report,
        ))
    }

    /// Commit source changes with their index updates and notify listeners
    pub fn apply(&self, changes: &[SourceChange]) -> Result<usize> {
        apply_source_changes(
            &self.store,
            &self.registry,
            &self.owner,
            changes,
            Some(&self.notifier),
        )
    }

    /// Search entry names with the configured default limit
    pub fn search(&self, entry_type: &str, text: &str) -> Result<Vec<Document>> {
        self.registry
            .get_typed::<SearchIndex>()
            .ok_or_else(|| Error::InvalidConfig("search index is not enabled".into()))?
            .query(&self.store, entry_type, text)
    }

    /// Entries last modified by the owner, newest first; 0 = all
    pub fn recents(&self, limit: usize) -> Result<Vec<Document>> {
        self.registry
            .get_typed::<RecentsIndex>()
            .ok_or_else(|| Error::InvalidConfig("recents index is not enabled".into()))?
            .latest(&self.store, limit)
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registered indexes
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Dataset owner
    pub fn owner(&self) -> &DatasetOwner {
        &self.owner
    }

    /// Listeners notified after every rebuild and [`apply`](Self::apply)
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
