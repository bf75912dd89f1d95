//! Collection configuration via TOML
//!
//! A config file names the primary-key field, optionally caps the snapshot
//! stack, and lists the indexes to define, in order. Indexes whose key is an
//! extractor function cannot be configured here; define them in code.

use crate::collection::{Collection, DEFAULT_PRIMARY_KEY};
use crate::index::IndexDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use trellis_core::{Error, KeySpec, Result};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// One `[[index]]` table
///
/// Exactly one of `field` and `fields` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Index name
    pub name: String,
    /// `"eq"`, `"range"` or `"prefix"`
    pub kind: String,
    /// Reject a second record with an equal key (equality indexes only)
    #[serde(default)]
    pub unique: bool,
    /// Single field path, e.g. `"address.city"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Composite key field paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl IndexConfig {
    /// Convert into an index definition
    ///
    /// # Errors
    ///
    /// - `InvalidIndexKind` for an unknown kind
    /// - `ConfigError` unless exactly one of `field`/`fields` is set
    pub fn to_definition(&self) -> Result<IndexDefinition> {
        let key_spec = match (&self.field, &self.fields) {
            (Some(field), None) => KeySpec::field(field),
            (None, Some(fields)) if !fields.is_empty() => KeySpec::composite(fields),
            (None, Some(_)) => {
                return Err(Error::ConfigError(format!(
                    "index '{}': 'fields' must not be empty",
                    self.name
                )))
            }
            (Some(_), Some(_)) => {
                return Err(Error::ConfigError(format!(
                    "index '{}': set either 'field' or 'fields', not both",
                    self.name
                )))
            }
            (None, None) => {
                return Err(Error::ConfigError(format!(
                    "index '{}': missing 'field' or 'fields'",
                    self.name
                )))
            }
        };
        Ok(IndexDefinition::with_kind(self.name.as_str(), key_spec, &self.kind)?.unique(self.unique))
    }
}

/// Collection configuration.
///
/// # Example
///
/// ```toml
/// primary_key = "id"
/// max_snapshots = 16
///
/// [[index]]
/// name = "byEmail"
/// kind = "eq"
/// unique = true
/// field = "email"
///
/// [[index]]
/// name = "byCityAge"
/// kind = "range"
/// fields = ["city", "age"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionConfig {
    /// Primary-key field name (default: `"id"`)
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Snapshot stack cap; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_snapshots: Option<usize>,
    /// Indexes to define, in order
    #[serde(default, rename = "index")]
    pub indexes: Vec<IndexConfig>,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            max_snapshots: None,
            indexes: Vec::new(),
        }
    }
}

impl CollectionConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Trellis collection configuration
#
# Field holding each record's id (default: "id")
primary_key = "id"

# Maximum number of snapshots kept for rollback; the oldest is dropped
# first. Unbounded when absent.
# max_snapshots = 16

# Secondary indexes, defined in order.
#   kind   = "eq" | "range" | "prefix"
#   unique = true rejects duplicate keys (eq indexes only)
#   field  = "a.b"            single field (dot path)
#   fields = ["city", "age"]  composite key
#
# [[index]]
# name = "byEmail"
# kind = "eq"
# unique = true
# field = "email"
"#
    }

    /// Parse and validate a config from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text cannot be parsed, or any error of
    /// [`CollectionConfig::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CollectionConfig = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::ConfigError(msg) => {
                Error::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every index table and reject duplicate index names
    pub fn validate(&self) -> Result<()> {
        if self.primary_key.is_empty() {
            return Err(Error::ConfigError("primary_key must not be empty".to_string()));
        }
        for (i, index) in self.indexes.iter().enumerate() {
            index.to_definition()?;
            if self.indexes[..i].iter().any(|prev| prev.name == index.name) {
                return Err(Error::DuplicateIndexName {
                    name: index.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Collection {
    /// Create an empty collection with the configured primary key, snapshot
    /// cap and indexes
    pub fn from_config(config: &CollectionConfig) -> Result<Self> {
        let mut collection = Collection::new(config.primary_key.as_str());
        if let Some(max) = config.max_snapshots {
            collection = collection.with_max_snapshots(max);
        }
        for index in &config.indexes {
            collection.define_index(index.to_definition()?)?;
        }
        Ok(collection)
    }
}
