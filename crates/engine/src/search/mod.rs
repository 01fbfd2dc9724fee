//! Name search over source entries
//!
//! `SearchIndex` tokenizes the last path component of every entry and emits
//! one record per token plus one record for the entry type:
//!
//! ```text
//! index:search:term:<token>\t<id>   → <id>
//! index:search:type:<type>\t<id>    → <id>
//! ```
//!
//! `<type>` is `folder` for directories, the lowercase extension for files
//! that have one, and `file` otherwise.
//!
//! # Design Notes
//!
//! - Tokens and types never contain `\t`, so the id is everything after the
//!   first tab of the suffix.
//! - Queries are prefix queries per token: "hol pho" finds
//!   "Holiday Photos.jpg". Every query token must match.
//! - A query runs against one [`RangeIterator`], so the id lookups and the
//!   documents returned come from the same snapshot.

pub mod tokenizer;

use std::collections::BTreeSet;

use tracing::debug;

use mdindex_core::{Document, IndexKeys, KeyStore, Result};

use crate::index::{Index, IndexContext};
use crate::iterator::RangeIterator;

pub use tokenizer::{tokenize, tokenize_unique};

const TERM_PREFIX: &str = "term:";
const TYPE_PREFIX: &str = "type:";

/// Entry type recorded for directories
pub const FOLDER_TYPE: &str = "folder";
/// Entry type recorded for files without a usable extension
pub const FILE_TYPE: &str = "file";

/// Token index over entry names
#[derive(Debug, Clone)]
pub struct SearchIndex {
    keys: IndexKeys,
    default_limit: usize,
}

impl SearchIndex {
    /// Index name
    pub const NAME: &'static str = "search";
    /// Bump whenever `map` changes what it emits
    pub const VERSION: &'static str = "1";

    /// Search index with no default result limit
    pub fn new() -> Self {
        Self::with_default_limit(0)
    }

    /// Search index whose [`query`](Self::query) returns at most `limit` hits
    pub fn with_default_limit(limit: usize) -> Self {
        Self {
            keys: IndexKeys::new(Self::NAME),
            default_limit: limit,
        }
    }

    /// Result limit used by [`query`](Self::query); 0 means unlimited
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Find entries whose name matches every token of `text`
    ///
    /// A query token matches an entry when it is a prefix of one of the
    /// entry's name tokens. A non-empty `entry_type` restricts results to
    /// that type. With no query tokens, all entries of `entry_type` match;
    /// with neither, nothing does.
    ///
    /// Returns the source documents in ascending id order, at most `limit`
    /// of them unless `limit` is 0.
    pub fn search(
        &self,
        store: &dyn KeyStore,
        entry_type: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let tokens = tokenize_unique(text);
        let entry_type = entry_type.trim().to_lowercase();
        if tokens.is_empty() && entry_type.is_empty() {
            return Ok(Vec::new());
        }

        let mut it = RangeIterator::new(store, self.keys.prefix());

        let mut candidates: Option<BTreeSet<String>> = None;
        for token in &tokens {
            let ids = ids_with_prefix(&mut it, &format!("{TERM_PREFIX}{token}"));
            narrow(&mut candidates, ids);
        }
        if !entry_type.is_empty() {
            let ids = ids_with_prefix(&mut it, &format!("{TYPE_PREFIX}{entry_type}\t"));
            narrow(&mut candidates, ids);
        }

        let mut results = Vec::new();
        for id in candidates.unwrap_or_default() {
            if limit != 0 && results.len() >= limit {
                break;
            }
            let Some(bytes) = it.source_value(&id)? else {
                continue;
            };
            match serde_json::from_slice::<Document>(&bytes) {
                Ok(doc) => results.push(doc),
                Err(e) => {
                    debug!(target: "mdindex::index", index = Self::NAME, id = %id, error = %e, "Skipping unreadable search hit");
                }
            }
        }

        debug!(
            target: "mdindex::index",
            index = Self::NAME,
            tokens = tokens.len(),
            hits = results.len(),
            "Search completed"
        );
        Ok(results)
    }

    /// [`search`](Self::search) with the configured default limit
    pub fn query(&self, store: &dyn KeyStore, entry_type: &str, text: &str) -> Result<Vec<Document>> {
        self.search(store, entry_type, text, self.default_limit)
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for SearchIndex {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        Self::VERSION
    }

    fn map(&self, cx: &mut IndexContext<'_>, id: &str, doc: &Document) -> Result<()> {
        let Some(path) = doc["path"].as_str() else {
            return Ok(());
        };
        let name = entry_name(path);
        if name.is_empty() {
            return Ok(());
        }

        for token in tokenize_unique(name) {
            cx.emit(&format!("{TERM_PREFIX}{token}\t{id}"), id);
        }
        let is_dir = doc["is_dir"].as_bool().unwrap_or(false);
        cx.emit(&format!("{TYPE_PREFIX}{}\t{id}", entry_type(name, is_dir)), id);
        Ok(())
    }
}

/// Last component of a slash-separated path
fn entry_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// `folder`, the lowercase extension, or `file`
fn entry_type(name: &str, is_dir: bool) -> String {
    if is_dir {
        return FOLDER_TYPE.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(char::is_alphanumeric) =>
        {
            ext.to_lowercase()
        }
        _ => FILE_TYPE.to_string(),
    }
}

/// Ids of every record whose suffix starts with `start`
fn ids_with_prefix(it: &mut RangeIterator, start: &str) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    it.seek_to_key(start);
    while it.valid() {
        let Some(suffix) = it.key_str() else {
            it.next();
            continue;
        };
        if !suffix.starts_with(start) {
            break;
        }
        if let Some((_, id)) = suffix.split_once('\t') {
            ids.insert(id.to_string());
        }
        it.next();
    }
    ids
}

fn narrow(candidates: &mut Option<BTreeSet<String>>, ids: BTreeSet<String>) {
    match candidates {
        Some(current) => current.retain(|id| ids.contains(id)),
        None => *candidates = Some(ids),
    }
}
