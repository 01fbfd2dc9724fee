//! Readers scanning indexes while the writer commits

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mdindex::{Indexer, MemoryStore, RangeIterator, RecentsIndex, SearchIndex};

use crate::common::*;

fn time(second: usize) -> String {
    format!("Fri, 23 Jan 2015 22:15:{:02} +0000", second % 60)
}

#[test]
fn iterator_sees_one_consistent_state() {
    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    indexer
        .apply(&[
            put("1", file_doc("/one.txt", "r1", &time(1), None)),
            put("2", file_doc("/two.txt", "r1", &time(2), None)),
        ])
        .unwrap();

    let recents = indexer.registry().get_typed::<RecentsIndex>().unwrap();
    let mut it = recents.iterator(indexer.store());

    indexer.apply(&[remove("1"), put("3", file_doc("/three.txt", "r1", &time(3), None))]).unwrap();

    it.seek_to_last();
    let mut seen = Vec::new();
    while it.valid() {
        let doc = it.entry_document().unwrap().expect("source visible in snapshot");
        seen.push(doc["path"].as_str().unwrap().to_string());
        it.prev();
    }
    assert_eq!(seen, vec!["/two.txt", "/one.txt"]);

    assert_eq!(paths(&indexer.recents(0).unwrap()), vec!["/three.txt", "/two.txt"]);
}

#[test]
fn concurrent_readers_never_see_dangling_records() {
    let store = Arc::new(MemoryStore::new());
    let (indexer, _) = Indexer::open(Arc::clone(&store), &config()).unwrap();
    let search = indexer.registry().get_typed::<SearchIndex>().unwrap();
    let prefix = indexer.registry().get("search").unwrap().keys().prefix().to_vec();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            for n in 0..200 {
                let id = (n % 10).to_string();
                let change = if n % 3 == 2 {
                    remove(&id)
                } else {
                    put(&id, file_doc(&format!("/file {n}.txt"), &format!("r{n}"), &time(n), None))
                };
                indexer.apply(&[change]).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..2 {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let mut it = RangeIterator::new(&*store, prefix.clone());
                    it.seek_to_first();
                    while it.valid() {
                        assert!(
                            it.entry_value().unwrap().is_some(),
                            "index record without source record in one snapshot"
                        );
                        it.next();
                    }
                    for doc in search.search(&*store, "txt", "file", 0).unwrap() {
                        assert!(doc["path"].as_str().unwrap().starts_with("/file "));
                    }
                }
            });
        }
    });

    assert_eq!(store.live_snapshots(), 0);
}

#[test]
fn dropped_iterators_release_snapshots() {
    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    let recents = indexer.registry().get_typed::<RecentsIndex>().unwrap();
    {
        let _a = recents.iterator(indexer.store());
        let _b = recents.iterator(indexer.store());
        assert_eq!(indexer.store().live_snapshots(), 2);
    }
    indexer.recents(5).unwrap();
    assert_eq!(indexer.store().live_snapshots(), 0);
}
