//! Opening datasets: version checks, rebuilds, failed rebuilds

use std::sync::Arc;

use mdindex::{
    Error, IndexLoad, IndexRegistry, Indexer, IndexerConfig, KeyStore, MemoryStore, StoreCursor,
    StoreSnapshot, WriteBatch,
};

use crate::common::*;

// ========================================
// Version check on open
// ========================================

#[test]
fn fresh_dataset_builds_every_index() {
    init_tracing();
    let store = store_with_sources(&[
        ("1", file_doc("/a/notes.txt", "r1", "Fri, 23 Jan 2015 22:15:17 +0000", None)),
        ("2", folder_doc("/a")),
    ]);
    let (indexer, report) = Indexer::open(store, &config()).unwrap();

    assert!(matches!(report.get("search"), Some(IndexLoad::Rebuilt(s)) if s.mapped == 2));
    assert!(matches!(report.get("recents"), Some(IndexLoad::Rebuilt(s)) if s.mapped == 2));
    assert_eq!(paths(&indexer.search("", "notes").unwrap()), vec!["/a/notes.txt"]);
    assert_eq!(paths(&indexer.recents(0).unwrap()), vec!["/a/notes.txt"]);
}

#[test]
fn reopening_unchanged_dataset_writes_nothing() {
    let store = Arc::new(store_with_sources(&[(
        "1",
        file_doc("/x.txt", "r1", "Fri, 23 Jan 2015 22:15:17 +0000", None),
    )]));
    let (_first, _) = Indexer::open(Arc::clone(&store), &config()).unwrap();
    let sequence = store.sequence();

    let (_second, report) = Indexer::open(Arc::clone(&store), &config()).unwrap();
    assert_eq!(report.get("search"), Some(&IndexLoad::UpToDate));
    assert_eq!(report.get("recents"), Some(&IndexLoad::UpToDate));
    assert_eq!(store.sequence(), sequence);
}

#[test]
fn stored_version_mismatch_rebuilds_only_that_index() {
    let store = Arc::new(store_with_sources(&[(
        "1",
        file_doc("/x.txt", "r1", "Fri, 23 Jan 2015 22:15:17 +0000", None),
    )]));
    let (indexer, _) = Indexer::open(Arc::clone(&store), &config()).unwrap();

    // Simulate data written by an older build of the search index
    let search = indexer.registry().get("search").unwrap();
    let mut batch = WriteBatch::new();
    batch.put(search.keys().version_key(), "0");
    batch.put(search.keys().data_key("term:stale\t1"), "1");
    store.write(&batch).unwrap();
    drop(indexer);

    let (indexer, report) = Indexer::open(Arc::clone(&store), &config()).unwrap();
    assert!(matches!(report.get("search"), Some(IndexLoad::Rebuilt(_))));
    assert_eq!(report.get("recents"), Some(&IndexLoad::UpToDate));
    assert!(indexer.search("", "stale").unwrap().is_empty());
    assert_eq!(indexer.search("", "x").unwrap().len(), 1);
}

#[test]
fn listeners_hear_rebuilds_done_while_opening() {
    use mdindex::{ChangeKind, ChangeNotifier, DataChange};
    use parking_lot::Mutex;

    let store = Arc::new(store_with_sources(&[(
        "1",
        file_doc("/x.txt", "r1", "Fri, 23 Jan 2015 22:15:17 +0000", None),
    )]));
    let (indexer, _) = Indexer::open(Arc::clone(&store), &config()).unwrap();
    let search = indexer.registry().get("search").unwrap();
    let prefix = search.keys().prefix().to_vec();
    let stale = search.keys().data_key("term:stale\t1");
    let mut batch = WriteBatch::new();
    batch.put(search.keys().version_key(), "0");
    batch.put(stale.clone(), "1");
    store.write(&batch).unwrap();
    drop(indexer);

    let notifier = ChangeNotifier::new();
    let seen: Arc<Mutex<Vec<DataChange>>> = Arc::default();
    let sink = Arc::clone(&seen);
    notifier.add_listener(prefix, move |c: &[DataChange]| sink.lock().extend_from_slice(c));

    let (indexer, report) =
        Indexer::open_with_notifier(Arc::clone(&store), &config(), notifier).unwrap();
    assert!(matches!(report.get("search"), Some(IndexLoad::Rebuilt(_))));

    let seen = seen.lock();
    assert!(seen.contains(&DataChange { key: stale, kind: ChangeKind::Removed }));
    assert!(seen.contains(&DataChange {
        key: indexer.registry().get("search").unwrap().keys().data_key("term:x\t1"),
        kind: ChangeKind::Modified,
    }));
    assert!(seen.iter().all(|c| c.key.starts_with(b"index:search:")));
}

#[test]
fn config_selects_indexes() {
    let config = IndexerConfig {
        indexes: vec!["recents".into()],
        ..config()
    };
    let (indexer, report) = Indexer::ephemeral(&config).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(indexer.registry().names(), vec!["recents"]);
    assert!(matches!(indexer.search("", "x"), Err(Error::InvalidConfig(_))));
}

#[test]
fn unknown_index_in_config_fails_open() {
    let config = IndexerConfig {
        indexes: vec!["search".into(), "thumbnails".into()],
        ..config()
    };
    assert!(matches!(
        Indexer::ephemeral(&config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn open_from_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(mdindex::CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "owner_uid = \"u1\"\nindexes = [\"search\"]\n\n[search]\ndefault_limit = 1\n",
    )
    .unwrap();
    let config = IndexerConfig::from_file(&path).unwrap();

    let (indexer, _) = Indexer::ephemeral(&config).unwrap();
    indexer
        .apply(&[
            put("1", file_doc("/one.txt", "r1", "", None)),
            put("2", file_doc("/two.txt", "r1", "", None)),
        ])
        .unwrap();
    assert_eq!(paths(&indexer.search("txt", "").unwrap()), vec!["/one.txt"]);
}

#[test]
fn default_config_file_is_written_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(mdindex::CONFIG_FILE_NAME);
    IndexerConfig::write_default_if_missing(&path).unwrap();
    let config = IndexerConfig::from_file(&path).unwrap();
    assert_eq!(config.indexes, vec!["search", "recents"]);
}

// ========================================
// Failed rebuilds
// ========================================

/// Commits fail while `fail` is set
struct FlakyStore {
    inner: MemoryStore,
    fail: std::sync::atomic::AtomicBool,
}

impl KeyStore for FlakyStore {
    fn get(&self, key: &[u8]) -> mdindex::Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn write(&self, batch: &WriteBatch) -> mdindex::Result<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::storage("injected write failure"));
        }
        self.inner.write(batch)
    }

    fn cursor(&self) -> Box<dyn StoreCursor> {
        self.inner.cursor()
    }

    fn snapshot(&self) -> Box<dyn StoreSnapshot> {
        self.inner.snapshot()
    }
}

#[test]
fn failed_rebuild_is_reported_and_leaves_store_untouched() {
    init_tracing();
    let store = FlakyStore {
        inner: store_with_sources(&[(
            "1",
            file_doc("/x.txt", "r1", "Fri, 23 Jan 2015 22:15:17 +0000", None),
        )]),
        fail: std::sync::atomic::AtomicBool::new(true),
    };
    let before = dump(&store.inner);

    let registry = IndexRegistry::with_defaults();
    let owner = mdindex::DatasetOwner::new(OWNER);
    let report = registry.open(&store, &owner, None).unwrap();

    assert_eq!(report.failed(), vec!["search", "recents"]);
    assert!(!report.all_ready());
    match report.get("search") {
        Some(IndexLoad::RebuildFailed(reason)) => {
            assert!(reason.contains("search"));
            assert!(reason.contains("injected write failure"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(dump(&store.inner), before);

    store.fail.store(false, std::sync::atomic::Ordering::SeqCst);
    let report = registry.open(&store, &owner, None).unwrap();
    assert!(report.all_ready());
}
