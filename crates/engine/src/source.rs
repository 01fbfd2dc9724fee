//! Applying source record changes together with their index updates

use tracing::debug;

use mdindex_core::keyspace::source_key;
use mdindex_core::{Document, KeyStore, Result, WriteBatch};

use crate::changes::ChangeNotifier;
use crate::index::DatasetOwner;
use crate::registry::IndexRegistry;

/// A change to one source record, as delivered by the sync layer
#[derive(Debug, Clone, PartialEq)]
pub enum SourceChange {
    /// Record created or replaced
    Put {
        /// Source record id
        id: String,
        /// New document
        document: Document,
    },
    /// Record deleted
    Remove {
        /// Source record id
        id: String,
    },
}

impl SourceChange {
    /// Id of the affected source record
    pub fn id(&self) -> &str {
        match self {
            SourceChange::Put { id, .. } | SourceChange::Remove { id } => id,
        }
    }
}

/// Commit `changes` and every index update they imply as one batch
///
/// For each change, every registered index first drops what the record
/// emitted before and then, for a put, maps the new document. Source
/// records and index records therefore never disagree on disk. After a
/// successful commit the batch is passed to `notifier`, if one is given.
///
/// Returns the number of store operations committed.
pub fn apply_source_changes(
    store: &dyn KeyStore,
    registry: &IndexRegistry,
    owner: &DatasetOwner,
    changes: &[SourceChange],
    notifier: Option<&ChangeNotifier>,
) -> Result<usize> {
    if changes.is_empty() {
        return Ok(0);
    }

    let mut batch = WriteBatch::new();
    for change in changes {
        match change {
            SourceChange::Put { id, document } => {
                batch.put(source_key(id), serde_json::to_vec(document)?);
            }
            SourceChange::Remove { id } => batch.delete(source_key(id)),
        }
    }

    for handle in registry.iter() {
        let mut scope = handle.begin_update(owner, store, &mut batch);
        for change in changes {
            scope.remove(change.id())?;
            if let SourceChange::Put { id, document } = change {
                scope.put(id, document)?;
            }
        }
        scope.end();
    }

    store.write(&batch)?;
    debug!(
        target: "mdindex::index",
        changes = changes.len(),
        ops = batch.len(),
        "Applied source changes"
    );

    if let Some(notifier) = notifier {
        notifier.notify(&batch);
    }
    Ok(batch.len())
}
