//! Configuration loading for livelist.
//!
//! Configuration is loaded from a TOML file (default: `livelist.toml` in the
//! data directory). Every field has a default, so an absent file gives the
//! stock event list.

use list_controller::ListOptions;
use list_types::{EntitySchema, FieldKind, QueryDescriptor, SortKey, DEFAULT_BATCH_SIZE};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name looked up in the data directory.
pub const CONFIG_FILE: &str = "livelist.toml";

/// Field holding a record's manual order.
pub const POSITION_FIELD: &str = "position";

/// Field holding a record's creation time.
pub const TIMESTAMP_FIELD: &str = "timeStamp";

/// Root configuration for livelist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// List configuration.
    #[serde(default)]
    pub list: ListConfig,
}

/// List configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    /// Entity shown by the list (default: Event).
    #[serde(default = "default_entity")]
    pub entity: String,
    /// Screen title (defaults to the entity name).
    pub title: Option<String>,
    /// Row template identifier (default: Cell).
    #[serde(default = "default_cell_reuse_identifier")]
    pub cell_reuse_identifier: String,
    /// Allow deleting rows (default: true).
    #[serde(default = "default_true")]
    pub allow_editing: bool,
    /// Allow reordering rows (default: true).
    #[serde(default = "default_true")]
    pub allow_reordering: bool,
    /// Fetch batch size (default: 20).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Store cache identifier (default: Master).
    #[serde(default = "default_cache_name")]
    pub cache_name: Option<String>,
    /// Sort keys (default: position, then timeStamp, both ascending).
    #[serde(default = "default_sort")]
    pub sort: Vec<SortKey>,
    /// Optional grouping field.
    pub group_by: Option<String>,
}

fn default_entity() -> String {
    "Event".to_string()
}

fn default_cell_reuse_identifier() -> String {
    "Cell".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_cache_name() -> Option<String> {
    Some("Master".to_string())
}

fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey::ascending(POSITION_FIELD),
        SortKey::ascending(TIMESTAMP_FIELD),
    ]
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            entity: default_entity(),
            title: None,
            cell_reuse_identifier: default_cell_reuse_identifier(),
            allow_editing: default_true(),
            allow_reordering: default_true(),
            batch_size: default_batch_size(),
            cache_name: default_cache_name(),
            sort: default_sort(),
            group_by: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit config file if given, else `livelist.toml` from
    /// the data directory if present, else defaults.
    pub fn resolve(explicit: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

impl ListConfig {
    /// Query descriptor for the configured list.
    pub fn descriptor(&self) -> QueryDescriptor {
        let mut descriptor = QueryDescriptor::new(&self.entity)
            .sort_keys(self.sort.clone())
            .batch_size(self.batch_size);
        if let Some(cache) = &self.cache_name {
            descriptor = descriptor.cache_name(cache);
        }
        if let Some(group) = &self.group_by {
            descriptor = descriptor.group_by(group);
        }
        descriptor
    }

    /// Controller options for the configured list.
    pub fn options(&self) -> ListOptions {
        let options = ListOptions::new(&self.cell_reuse_identifier)
            .editable(self.allow_editing)
            .reorderable(self.allow_reordering);
        match &self.title {
            Some(title) => options.title(title),
            None => options,
        }
    }

    /// Schema registered for the configured entity.
    pub fn schema(&self) -> EntitySchema {
        let schema = EntitySchema::new(&self.entity)
            .field(POSITION_FIELD, FieldKind::Int)
            .field(TIMESTAMP_FIELD, FieldKind::Timestamp);
        match &self.group_by {
            Some(group) if group != POSITION_FIELD && group != TIMESTAMP_FIELD => {
                schema.field(group, FieldKind::Text)
            }
            _ => schema,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn default_config_is_the_event_list() {
        let config = Config::default();
        assert_eq!(config.list.entity, "Event");
        assert_eq!(config.list.cell_reuse_identifier, "Cell");
        assert!(config.list.allow_editing);
        assert!(config.list.allow_reordering);
        assert_eq!(config.list.batch_size, 20);
        assert_eq!(config.list.cache_name.as_deref(), Some("Master"));
        assert_eq!(
            config.list.sort,
            vec![
                SortKey::ascending("position"),
                SortKey::ascending("timeStamp")
            ]
        );
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[list]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.list.entity, "Event");
        assert_eq!(config.list.sort.len(), 2);
    }

    #[test]
    fn parse_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.list.cell_reuse_identifier, "Cell");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[list]
entity = "Task"
title = "Chores"
cell_reuse_identifier = "TaskCell"
allow_editing = false
allow_reordering = false
batch_size = 50
cache_name = "Tasks"
group_by = "room"

[[list.sort]]
field = "room"

[[list.sort]]
field = "position"
ascending = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let list = &config.list;
        assert_eq!(list.entity, "Task");
        assert_eq!(list.title.as_deref(), Some("Chores"));
        assert!(!list.allow_editing);
        assert!(!list.allow_reordering);
        assert_eq!(list.batch_size, 50);
        assert_eq!(
            list.sort,
            vec![SortKey::ascending("room"), SortKey::descending("position")]
        );

        let descriptor = list.descriptor();
        assert_eq!(descriptor.entity, "Task");
        assert_eq!(descriptor.group_by.as_deref(), Some("room"));
        assert_eq!(descriptor.cache_name.as_deref(), Some("Tasks"));
        assert_eq!(descriptor.batch_size, 50);

        let options = list.options();
        assert_eq!(options.cell_reuse_identifier, "TaskCell");
        assert_eq!(options.title.as_deref(), Some("Chores"));

        let schema = list.schema();
        assert_eq!(schema.kind_of("room"), Some(FieldKind::Text));
        assert_eq!(schema.kind_of("position"), Some(FieldKind::Int));
    }

    #[test]
    fn default_descriptor_validates_against_schema() {
        let list = ListConfig::default();
        assert!(list.descriptor().validate(&list.schema()).is_ok());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[list]\ntitle = \"Events\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.list.title.as_deref(), Some("Events"));
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn from_file_invalid_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[list\nentity = ").unwrap();
        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn resolve_prefers_data_dir_file_over_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(
            Config::resolve(None, dir.path()).unwrap().list.title,
            None
        );

        std::fs::write(dir.path().join(CONFIG_FILE), "[list]\ntitle = \"Log\"\n").unwrap();
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.list.title.as_deref(), Some("Log"));
    }
}
