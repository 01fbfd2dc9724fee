#![allow(dead_code)]

//! Shared fixtures

use mdindex::{Document, IndexerConfig, KeyStore, MemoryStore, SourceChange, WriteBatch};
use serde_json::json;

pub const OWNER: &str = "u1";

/// Route engine logs to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn config() -> IndexerConfig {
    IndexerConfig {
        owner_uid: OWNER.into(),
        ..IndexerConfig::default()
    }
}

/// A file document as the sync layer delivers it
pub fn file_doc(path: &str, rev: &str, modified: &str, modifier_uid: Option<&str>) -> Document {
    json!({
        "path": path,
        "is_dir": false,
        "rev": rev,
        "modified": modified,
        "modifier": modifier_uid.map(|uid| json!({"uid": uid})),
    })
}

pub fn folder_doc(path: &str) -> Document {
    json!({"path": path, "is_dir": true, "rev": "", "modified": "", "modifier": null})
}

pub fn put(id: &str, document: Document) -> SourceChange {
    SourceChange::Put {
        id: id.into(),
        document,
    }
}

pub fn remove(id: &str) -> SourceChange {
    SourceChange::Remove { id: id.into() }
}

/// Store holding only the given source records, no index data
pub fn store_with_sources(records: &[(&str, Document)]) -> MemoryStore {
    let store = MemoryStore::new();
    let mut batch = WriteBatch::new();
    for (id, doc) in records {
        batch.put(
            mdindex::keyspace::source_key(id),
            serde_json::to_vec(doc).unwrap(),
        );
    }
    store.write(&batch).unwrap();
    store
}

/// Every record of the store
pub fn dump(store: &MemoryStore) -> Vec<(Vec<u8>, Vec<u8>)> {
    store
        .keys()
        .into_iter()
        .map(|k| {
            let v = store.get(&k).unwrap().unwrap();
            (k, v)
        })
        .collect()
}

pub fn paths(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|d| d["path"].as_str().unwrap_or_default().to_string())
        .collect()
}
