//! Indexer configuration via `mdindex.toml`
//!
//! A default `mdindex.toml` is written next to the dataset on first use. To
//! change which indexes run, edit the file and restart; any change to the
//! index list or an index version is picked up by the version check on the
//! next [`IndexRegistry::open`](crate::registry::IndexRegistry::open).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use mdindex_core::{Error, Result};

use crate::index::DatasetOwner;
use crate::registry::KNOWN_INDEXES;

/// Config file name placed in the dataset directory
pub const CONFIG_FILE_NAME: &str = "mdindex.toml";

/// Settings for the search index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum results returned by a query that sets no limit; 0 = unlimited
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

fn default_search_limit() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

/// Indexer configuration loaded from `mdindex.toml`
///
/// # Example
///
/// ```toml
/// owner_uid = "12345"
/// indexes = ["search", "recents"]
///
/// [search]
/// default_limit = 100
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexerConfig {
    /// User id of the dataset owner
    #[serde(default)]
    pub owner_uid: String,
    /// Indexes to maintain, in registration order
    #[serde(default = "default_indexes")]
    pub indexes: Vec<String>,
    /// Search index settings
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_indexes() -> Vec<String> {
    KNOWN_INDEXES.iter().map(|s| s.to_string()).collect()
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            owner_uid: String::new(),
            indexes: default_indexes(),
            search: SearchConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Dataset owner described by `owner_uid`
    pub fn owner(&self) -> DatasetOwner {
        DatasetOwner::new(self.owner_uid.clone())
    }

    /// Reject unknown or repeated index names
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for name in &self.indexes {
            if !KNOWN_INDEXES.contains(&name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "Unknown index '{}' in {}. Expected one of: {}",
                    name,
                    CONFIG_FILE_NAME,
                    KNOWN_INDEXES.join(", ")
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "Index '{}' listed twice in {}",
                    name, CONFIG_FILE_NAME
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# mdindex configuration
#
# User id of the dataset owner. The recents index only lists entries
# last modified by this user.
owner_uid = ""

# Indexes to maintain, in order. Known: "search", "recents"
indexes = ["search", "recents"]

[search]
# Results returned by a query that sets no limit (0 = unlimited)
default_limit = 100
"#
    }

    /// Read, parse and validate config from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or names an
    /// unknown index.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: IndexerConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::SerializationError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
