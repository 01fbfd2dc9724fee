//! Change notification for committed batches
//!
//! Consumers register a listener for a key prefix (for example the recents
//! index prefix, to refresh a "recent files" view). After every batch the
//! engine commits, [`ChangeNotifier::notify`] hands each listener the
//! changes under its prefix.
//!
//! # Design Notes
//!
//! - Listeners run synchronously on the committing thread, after the commit,
//!   and outside the registry lock, so a listener may add or remove
//!   listeners.
//! - A key written several times in one batch is reported once, at its first
//!   position, with the kind of its last operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use mdindex_core::{BatchOp, WriteBatch};

/// What happened to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Created or overwritten
    Modified,
    /// Deleted
    Removed,
}

/// One committed change to a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    /// Full store key
    pub key: Vec<u8>,
    /// Kind of the last operation on the key in the batch
    pub kind: ChangeKind,
}

/// Handle returned by [`ChangeNotifier::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&[DataChange]) + Send + Sync>;

/// Prefix-scoped listeners for committed changes
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RwLock<BTreeMap<Vec<u8>, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    /// Notifier with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` with the changes under `prefix` of every notified batch
    pub fn add_listener<F>(&self, prefix: impl Into<Vec<u8>>, listener: F) -> ListenerId
    where
        F: Fn(&[DataChange]) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(prefix.into())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Unregister a listener; returns whether it was registered under `prefix`
    pub fn remove_listener(&self, prefix: &[u8], id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(prefix) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(prefix);
        }
        removed
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().values().map(Vec::len).sum()
    }

    /// Deliver the changes in a committed `batch`
    pub fn notify(&self, batch: &WriteBatch) {
        let registered: Vec<(Vec<u8>, Vec<Listener>)> = {
            let listeners = self.listeners.read();
            if listeners.is_empty() {
                return;
            }
            listeners
                .iter()
                .map(|(prefix, list)| (prefix.clone(), list.iter().map(|(_, l)| Arc::clone(l)).collect()))
                .collect()
        };

        let changes = collapse(batch);
        for (prefix, listeners) in registered {
            let matching: Vec<DataChange> = changes
                .iter()
                .filter(|c| c.key.starts_with(&prefix))
                .cloned()
                .collect();
            if matching.is_empty() {
                continue;
            }
            trace!(
                target: "mdindex::changes",
                prefix = %String::from_utf8_lossy(&prefix),
                changes = matching.len(),
                listeners = listeners.len(),
                "Notifying listeners"
            );
            for listener in &listeners {
                listener(&matching);
            }
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// One change per key: first position, last kind
fn collapse(batch: &WriteBatch) -> Vec<DataChange> {
    let mut changes: Vec<DataChange> = Vec::with_capacity(batch.len());
    let mut position: HashMap<&[u8], usize> = HashMap::new();
    for op in batch {
        let kind = match op {
            BatchOp::Put { .. } => ChangeKind::Modified,
            BatchOp::Delete { .. } => ChangeKind::Removed,
        };
        match position.get(op.key()) {
            Some(&i) => changes[i].kind = kind,
            None => {
                position.insert(op.key(), changes.len());
                changes.push(DataChange {
                    key: op.key().to_vec(),
                    kind,
                });
            }
        }
    }
    changes
}
