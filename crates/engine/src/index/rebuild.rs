//! Full index rebuild from the source records

use std::ops::ControlFlow;

use tracing::{debug, info, warn};

use mdindex_core::keyspace::source_id;
use mdindex_core::{Document, Error, KeyStore, Result, WriteBatch, SOURCE_PREFIX};
use mdindex_storage::for_each_in_range;

use super::{DatasetOwner, IndexHandle};
use crate::changes::ChangeNotifier;

/// Outcome of a successful rebuild
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    /// Source records passed to `map()`
    pub mapped: usize,
    /// Source records skipped because their value was not a JSON object
    pub skipped: usize,
    /// Index records staged for deletion before re-mapping
    pub cleared: usize,
}

impl IndexHandle {
    /// Drop everything in the index and map every source record again
    ///
    /// Clears the index's data and meta ranges, runs `init()`, stamps the
    /// compiled-in version and maps every source record of the live view in
    /// ascending id order. All of it goes into one batch, so a failed commit
    /// leaves the index exactly as it was. After a successful commit the
    /// batch is passed to `notifier`, if one is given.
    ///
    /// Source values that are not JSON objects are skipped one at a time.
    /// Any failure comes back as [`Error::Rebuild`] carrying the index name.
    pub fn rebuild(
        &self,
        owner: &DatasetOwner,
        store: &dyn KeyStore,
        notifier: Option<&ChangeNotifier>,
    ) -> Result<RebuildStats> {
        let fail = |reason: String| {
            warn!(target: "mdindex::index", index = self.name(), %reason, "Rebuild failed");
            Error::Rebuild {
                index: self.name().to_string(),
                reason,
            }
        };

        let mut stats = RebuildStats::default();
        let mut batch = WriteBatch::new();
        {
            let mut scope = self.begin_update(owner, store, &mut batch);
            stats.cleared = scope.clear();
            scope.init().map_err(|e| fail(e.to_string()))?;
            scope.write_version();

            let mut map_error = None;
            for_each_in_range(store.cursor(), SOURCE_PREFIX, |key, value| {
                let Some(id) = source_id(key) else {
                    return ControlFlow::Continue(());
                };
                let id = String::from_utf8_lossy(id);
                let doc = match serde_json::from_slice::<Document>(value) {
                    Ok(doc) if doc.is_object() => doc,
                    Ok(_) => {
                        debug!(target: "mdindex::index", index = self.name(), id = %id, "Skipping non-object source record");
                        stats.skipped += 1;
                        return ControlFlow::Continue(());
                    }
                    Err(e) => {
                        debug!(target: "mdindex::index", index = self.name(), id = %id, error = %e, "Skipping malformed source record");
                        stats.skipped += 1;
                        return ControlFlow::Continue(());
                    }
                };
                match scope.put(&id, &doc) {
                    Ok(()) => {
                        stats.mapped += 1;
                        ControlFlow::Continue(())
                    }
                    Err(e) => {
                        map_error = Some(e);
                        ControlFlow::Break(())
                    }
                }
            });
            if let Some(e) = map_error {
                return Err(fail(e.to_string()));
            }
            scope.end();
        }

        store.write(&batch).map_err(|e| fail(e.to_string()))?;

        info!(
            target: "mdindex::index",
            index = self.name(),
            version = self.version(),
            mapped = stats.mapped,
            skipped = stats.skipped,
            "Rebuilt index"
        );

        if let Some(notifier) = notifier {
            notifier.notify(&batch);
        }
        Ok(stats)
    }
}
