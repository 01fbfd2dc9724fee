//! Key space layout
//!
//! All records share one ordered store, split into disjoint byte ranges:
//!
//! ```text
//! file:<id>                         source record (JSON document)
//! index:<name>:<suffix>             index record emitted by map()
//! index:<name>:\xff_version_        version record of the index
//! index:<name>:\xff_keys_:<id>      reverse lookup for source record <id>
//! index:<name>:\xff<meta key>       index-private meta record
//! ```
//!
//! ## Terminal bound
//!
//! The exclusive upper bound of a prefix range is `prefix + 0xFF`. Meta
//! records live at or above that bound, so a scan of `[prefix, terminal)`
//! never surfaces them.
//!
//! This relies on no suffix containing a raw `0xFF` byte. Suffixes are `&str`
//! and UTF-8 never encodes a `0xFF` byte, so the assumption holds for every
//! key built through this module. A store shared with writers that put raw
//! bytes under an index prefix would silently truncate or leak range scans.

/// Prefix of every source record key
pub const SOURCE_PREFIX: &[u8] = b"file:";

/// Prefix shared by every index namespace
pub const INDEX_PREFIX: &str = "index:";

/// Reserved byte separating an index's data records from its meta records
/// and terminating every prefix range
pub const META_SENTINEL: u8 = 0xFF;

/// Meta key holding the index version
pub const VERSION_META_KEY: &str = "_version_";

/// Meta key prefix of reverse lookup records
pub const REVERSE_LOOKUP_META_PREFIX: &str = "_keys_:";

/// Key of the source record for `id`
pub fn source_key(id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(SOURCE_PREFIX.len() + id.len());
    key.extend_from_slice(SOURCE_PREFIX);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Source record id encoded in `key`, if `key` is a source record key
pub fn source_id(key: &[u8]) -> Option<&[u8]> {
    key.strip_prefix(SOURCE_PREFIX)
}

/// Exclusive upper bound of the range of keys starting with `prefix`
pub fn terminal(prefix: &[u8]) -> Vec<u8> {
    let mut bound = Vec::with_capacity(prefix.len() + 1);
    bound.extend_from_slice(prefix);
    bound.push(META_SENTINEL);
    bound
}

/// Key encoder for one index namespace (`index:<name>:`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeys {
    name: String,
    prefix: Vec<u8>,
}

impl IndexKeys {
    /// Key layout for the index called `name`
    pub fn new(name: &str) -> Self {
        let prefix = format!("{INDEX_PREFIX}{name}:").into_bytes();
        Self {
            name: name.to_string(),
            prefix,
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix shared by all of this index's records, data and meta
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Exclusive upper bound of the data range; also the start of the meta range
    pub fn terminal(&self) -> Vec<u8> {
        terminal(&self.prefix)
    }

    /// Full key of the index record with `suffix`
    pub fn data_key(&self, suffix: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + suffix.len());
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(suffix.as_bytes());
        key
    }

    /// Full key of the meta record `meta_key`
    pub fn meta_key(&self, meta_key: &str) -> Vec<u8> {
        let mut key = self.terminal();
        key.extend_from_slice(meta_key.as_bytes());
        key
    }

    /// Full key of the version record
    pub fn version_key(&self) -> Vec<u8> {
        self.meta_key(VERSION_META_KEY)
    }

    /// Full key of the reverse lookup record for source record `id`
    pub fn reverse_lookup_key(&self, id: &str) -> Vec<u8> {
        self.meta_key(&format!("{REVERSE_LOOKUP_META_PREFIX}{id}"))
    }
}
