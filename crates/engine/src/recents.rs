//! Recently modified entries, newest last in key order
//!
//! `RecentsIndex` keeps one record per file last modified by the dataset
//! owner:
//!
//! ```text
//! index:recents:<YYYY-MM-DD HH:MM:SS>\t<rev>   → <id>
//! ```
//!
//! The timestamp is UTC and fixed width, so key order is chronological and
//! `seek_to_last` + `prev` walks newest first. The revision breaks ties
//! between entries modified in the same second.
//!
//! Directories are skipped: their modifier field is always empty, so there
//! is no telling who touched them.
//!
//! Revisions are assumed unique across ids. The key holds no id, so two
//! files sharing a timestamp and a revision share one record: the later
//! put overwrites it, and removing either id deletes it for both.

use chrono::{DateTime, Utc};
use tracing::debug;

use mdindex_core::{Document, IndexKeys, KeyStore, Result};

use crate::index::{Index, IndexContext};
use crate::iterator::RangeIterator;

/// Format of the `modified` field after its weekday, e.g. `23 Jan 2015 22:15:17 +0000`
const MODIFIED_FORMAT: &str = "%d %b %Y %H:%M:%S %z";
/// Format of the key prefix, e.g. `2015-01-23 22:15:17`
const SORTABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Meta record remembering the last key emitted for an id
const ID_TO_ENTRY_PREFIX: &str = "id-to-entry:";

/// Convert a `modified` timestamp into its sortable UTC form
///
/// The leading weekday name is skipped unchecked, so a weekday that does
/// not match the date is ignored. Returns an empty string when `modified`
/// cannot be parsed. Such entries sort before every valid timestamp and
/// only the revision tells them apart.
pub fn sortable_timestamp(modified: &str) -> String {
    let modified = modified.trim();
    let date = match modified.split_once(", ") {
        Some((weekday, rest)) if weekday.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => modified,
    };
    match DateTime::parse_from_str(date, MODIFIED_FORMAT) {
        Ok(ts) => ts.with_timezone(&Utc).format(SORTABLE_FORMAT).to_string(),
        Err(e) => {
            debug!(target: "mdindex::index", index = RecentsIndex::NAME, modified, error = %e, "Unparseable modification time");
            String::new()
        }
    }
}

/// Index of files last modified by the dataset owner, in time order
#[derive(Debug, Clone)]
pub struct RecentsIndex {
    keys: IndexKeys,
}

impl RecentsIndex {
    /// Index name
    pub const NAME: &'static str = "recents";
    /// Bump whenever `map` changes what it emits
    pub const VERSION: &'static str = "3";

    /// The recents index
    pub fn new() -> Self {
        Self {
            keys: IndexKeys::new(Self::NAME),
        }
    }

    /// Iterator over the recents records under a fresh snapshot
    ///
    /// Start with `seek_to_last` and step with `prev` for newest first.
    pub fn iterator(&self, store: &dyn KeyStore) -> RangeIterator {
        RangeIterator::new(store, self.keys.prefix())
    }

    /// Up to `limit` source documents, most recently modified first
    ///
    /// A `limit` of 0 returns every entry.
    pub fn latest(&self, store: &dyn KeyStore, limit: usize) -> Result<Vec<Document>> {
        let mut it = self.iterator(store);
        let mut docs = Vec::new();
        it.seek_to_last();
        while it.valid() && (limit == 0 || docs.len() < limit) {
            if let Some(doc) = it.entry_document()? {
                docs.push(doc);
            }
            it.prev();
        }
        Ok(docs)
    }
}

impl Default for RecentsIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for RecentsIndex {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        Self::VERSION
    }

    fn map(&self, cx: &mut IndexContext<'_>, id: &str, doc: &Document) -> Result<()> {
        if doc["is_dir"].as_bool().unwrap_or(false) {
            return Ok(());
        }

        let modifier = &doc["modifier"];
        if !modifier.is_null() && modifier_uid(modifier).as_deref() != Some(cx.owner().uid()) {
            return Ok(());
        }

        let entry_key = format!(
            "{}\t{}",
            sortable_timestamp(doc["modified"].as_str().unwrap_or_default()),
            doc["rev"].as_str().unwrap_or_default()
        );

        let meta_key = format!("{ID_TO_ENTRY_PREFIX}{id}");
        let existing = cx
            .get_meta(&meta_key)?
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .filter(|v| !v.is_empty());

        match existing {
            Some(existing) if existing == entry_key => {}
            existing => {
                if let Some(old) = existing {
                    cx.remove(&old);
                }
                cx.emit(&entry_key, id);
                cx.put_meta(&meta_key, &entry_key);
            }
        }
        Ok(())
    }
}

/// The modifier's uid as a string; uids arrive as JSON numbers or strings
///
/// Fractional numbers are truncated to an integer.
fn modifier_uid(modifier: &Document) -> Option<String> {
    let uid = &modifier["uid"];
    if let Some(n) = uid.as_i64() {
        return Some(n.to_string());
    }
    if let Some(n) = uid.as_u64() {
        return Some(n.to_string());
    }
    if let Some(n) = uid.as_f64() {
        return Some((n as i64).to_string());
    }
    uid.as_str().map(str::to_string)
}
