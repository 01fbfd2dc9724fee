//! Incremental maintenance must agree with a rebuild from scratch

use proptest::prelude::*;

use mdindex::{Document, Indexer, SourceChange};

use crate::common::*;

const NAMES: &[&str] = &[
    "/Photos/cat.jpg",
    "/Photos/Cat Pictures",
    "/Docs/report final.pdf",
    "/Docs/report.draft.PDF",
    "/notes",
];

const TIMES: &[&str] = &[
    "Fri, 23 Jan 2015 22:15:17 +0000",
    "Sat, 24 Jan 2015 08:00:00 +0100",
    "not a date",
];

/// Revisions are unique per id, as the sync layer hands them out
fn document(id: u8, name: usize, rev: u8, time: usize, by_owner: bool, is_dir: bool) -> Document {
    if is_dir {
        return folder_doc(NAMES[name]);
    }
    let modifier = if by_owner { None } else { Some("someone-else") };
    file_doc(NAMES[name], &format!("{id}-rev{rev}"), TIMES[time], modifier)
}

fn change_strategy() -> impl Strategy<Value = SourceChange> {
    let id = 0u8..5;
    prop_oneof![
        3 => (
            id.clone(),
            0..NAMES.len(),
            0u8..4,
            0..TIMES.len(),
            any::<bool>(),
            prop::bool::weighted(0.2)
        )
            .prop_map(|(id, name, rev, time, by_owner, is_dir)| {
                put(&id.to_string(), document(id, name, rev, time, by_owner, is_dir))
            }),
        1 => id.prop_map(|id| remove(&id.to_string())),
    ]
}

/// Source records left after applying `changes` in order
fn final_sources(changes: &[SourceChange]) -> Vec<(String, Document)> {
    let mut sources = std::collections::BTreeMap::new();
    for change in changes {
        match change {
            SourceChange::Put { id, document } => {
                sources.insert(id.clone(), document.clone());
            }
            SourceChange::Remove { id } => {
                sources.remove(id);
            }
        }
    }
    sources.into_iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn incremental_updates_match_full_rebuild(
        batches in prop::collection::vec(prop::collection::vec(change_strategy(), 1..6), 1..8)
    ) {
        let (incremental, _) = Indexer::ephemeral(&config()).unwrap();
        for batch in &batches {
            incremental.apply(batch).unwrap();
        }

        let all: Vec<SourceChange> = batches.into_iter().flatten().collect();
        let sources = final_sources(&all);
        let records: Vec<(&str, Document)> =
            sources.iter().map(|(id, doc)| (id.as_str(), doc.clone())).collect();
        let (rebuilt, _) = Indexer::open(store_with_sources(&records), &config()).unwrap();

        prop_assert_eq!(dump(incremental.store()), dump(rebuilt.store()));
    }

    #[test]
    fn applying_same_batch_twice_changes_nothing(
        changes in prop::collection::vec(change_strategy(), 1..8)
    ) {
        let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
        indexer.apply(&changes).unwrap();
        let once = dump(indexer.store());
        indexer.apply(&changes).unwrap();
        prop_assert_eq!(dump(indexer.store()), once);
    }
}

// ========================================
// Scenarios
// ========================================

#[test]
fn owner_edit_moves_entry_to_front_of_recents() {
    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    indexer
        .apply(&[
            put("a", file_doc("/a.txt", "r1", "Wed, 21 Jan 2015 10:00:00 +0000", None)),
            put("b", file_doc("/b.txt", "r1", "Thu, 22 Jan 2015 10:00:00 +0000", None)),
        ])
        .unwrap();
    assert_eq!(paths(&indexer.recents(0).unwrap()), vec!["/b.txt", "/a.txt"]);

    indexer
        .apply(&[put("a", file_doc("/a.txt", "r2", "Fri, 23 Jan 2015 10:00:00 +0000", None))])
        .unwrap();
    assert_eq!(paths(&indexer.recents(0).unwrap()), vec!["/a.txt", "/b.txt"]);
}

#[test]
fn edit_by_someone_else_drops_entry_from_recents() {
    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    indexer
        .apply(&[put("a", file_doc("/a.txt", "r1", "Wed, 21 Jan 2015 10:00:00 +0000", None))])
        .unwrap();
    indexer
        .apply(&[put(
            "a",
            file_doc("/a.txt", "r2", "Thu, 22 Jan 2015 10:00:00 +0000", Some("u2")),
        )])
        .unwrap();
    assert!(indexer.recents(0).unwrap().is_empty());
    assert_eq!(indexer.search("txt", "").unwrap().len(), 1);
}

#[test]
fn search_results_follow_renames_and_deletes() {
    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    indexer
        .apply(&[
            put("1", file_doc("/Budget 2015.xlsx", "r1", TIMES[0], None)),
            put("2", folder_doc("/Budget")),
        ])
        .unwrap();
    assert_eq!(paths(&indexer.search("", "budg").unwrap()), vec!["/Budget 2015.xlsx", "/Budget"]);
    assert_eq!(paths(&indexer.search("folder", "budg").unwrap()), vec!["/Budget"]);

    indexer
        .apply(&[
            put("1", file_doc("/Forecast 2016.xlsx", "r2", TIMES[0], None)),
            remove("2"),
        ])
        .unwrap();
    assert!(indexer.search("", "budget").unwrap().is_empty());
    assert_eq!(paths(&indexer.search("xlsx", "2016").unwrap()), vec!["/Forecast 2016.xlsx"]);
}

#[test]
fn listeners_hear_about_index_changes() {
    use mdindex::{ChangeKind, DataChange};
    use parking_lot::Mutex;
    use std::sync::Arc;

    let (indexer, _) = Indexer::ephemeral(&config()).unwrap();
    let recents_prefix = indexer.registry().get("recents").unwrap().keys().prefix().to_vec();
    let seen: Arc<Mutex<Vec<DataChange>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let id = indexer
        .notifier()
        .add_listener(recents_prefix.clone(), move |c: &[DataChange]| sink.lock().extend_from_slice(c));

    indexer
        .apply(&[put("a", file_doc("/a.txt", "r1", TIMES[0], None))])
        .unwrap();
    indexer.apply(&[remove("a")]).unwrap();

    let kinds: Vec<ChangeKind> = seen
        .lock()
        .iter()
        .filter(|c| !c.key.contains(&0xFF))
        .map(|c| c.kind)
        .collect();
    assert_eq!(kinds, vec![ChangeKind::Modified, ChangeKind::Removed]);

    assert!(indexer.notifier().remove_listener(&recents_prefix, id));
}
