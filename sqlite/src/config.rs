//! Store configuration.
//!
//! Defines the YAML-serializable configuration that controls where the
//! database lives, which schema version the application expects, and the
//! debug recreate behavior.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/app.db
//! schema_version: 2
//! debug_recreate_schema_on_open: false
//! busy_timeout_ms: 5000
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration for a [`Database`](crate::Database).
///
/// # Examples
///
/// ```
/// use rowkit_sqlite::StoreConfig;
///
/// let config = StoreConfig::in_memory();
/// assert_eq!(config.schema_version, 1);
/// assert!(!config.debug_recreate_schema_on_open);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Filesystem path of the database file. `None` opens an in-memory
    /// database, which is what tests want.
    pub path: Option<PathBuf>,

    /// The schema version this application expects, stamped into
    /// `PRAGMA user_version` after creation or upgrade.
    pub schema_version: u32,

    /// Drop and recreate every schema object on each open, discarding all
    /// rows. Intended for debug cycles only.
    pub debug_recreate_schema_on_open: bool,

    /// SQLite busy timeout, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            schema_version: 1,
            debug_recreate_schema_on_open: false,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// An in-memory database with default settings.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A file-backed database at the given path, with default settings.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the expected schema version, consuming and returning `self`.
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Saves the configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_in_memory_version_one() {
        let config = StoreConfig::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema_version, 1);
        assert!(!config.debug_recreate_schema_on_open);
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: StoreConfig = serde_yaml::from_str("schema_version: 3\n").unwrap();
        assert_eq!(config.schema_version, 3);
        assert!(config.path.is_none());
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = StoreConfig::at("data/app.db").with_schema_version(4);
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: StoreConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.path, Some(PathBuf::from("data/app.db")));
        assert_eq!(parsed.schema_version, 4);
    }

    #[test]
    fn test_load_and_save_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.yml");

        let config = StoreConfig::at("app.db").with_schema_version(2);
        config.save(&path).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded.path, Some(PathBuf::from("app.db")));
        assert_eq!(loaded.schema_version, 2);
    }
}
