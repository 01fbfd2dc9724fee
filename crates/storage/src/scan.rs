//! Prefix scans and whole-store deletion
//!
//! `for_each_in_range` is the bounded scan every full pass over a key range
//! goes through (index rebuilds, clearing an index namespace). It works on
//! any `StoreCursor`, so the same code scans the live view or a snapshot.

use std::ops::ControlFlow;

use mdindex_core::keyspace::terminal;
use mdindex_core::{KeyStore, StoreCursor, WriteBatch};

/// Visit every record in `[prefix, prefix + 0xFF)` in ascending key order
///
/// `f` receives the full key and the value and returns
/// `ControlFlow::Break(())` to stop the scan early. An empty prefix visits
/// the whole store. Returns the number of records passed to `f`.
pub fn for_each_in_range<F>(mut cursor: Box<dyn StoreCursor>, prefix: &[u8], mut f: F) -> usize
where
    F: FnMut(&[u8], &[u8]) -> ControlFlow<()>,
{
    let bound = (!prefix.is_empty()).then(|| terminal(prefix));
    let mut visited = 0;

    if prefix.is_empty() {
        cursor.seek_to_first();
    } else {
        cursor.seek(prefix);
    }

    while cursor.valid() {
        let key = cursor.key();
        if let Some(bound) = &bound {
            if !key.starts_with(prefix) || key >= bound.as_slice() {
                break;
            }
        }
        visited += 1;
        if f(key, cursor.value()).is_break() {
            break;
        }
        cursor.next();
    }

    visited
}

/// Stage deletion of every record in the store into `batch`
///
/// Destructive whole-store operation for reset and teardown paths. Never
/// used while indexing. Returns the number of deletes staged.
pub fn delete_all(store: &dyn KeyStore, batch: &mut WriteBatch) -> usize {
    let count = for_each_in_range(store.cursor(), &[], |key, _| {
        batch.delete(key);
        ControlFlow::Continue(())
    });
    tracing::warn!(target: "mdindex::store", records = count, "Staged deletion of every record");
    count
}
