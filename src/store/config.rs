//! Store configuration
//!
//! Loaded from JSON or YAML; every field has a default so a partial file
//! (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What `len(None)` counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LenMode {
    /// Asserted members of the default graph
    #[default]
    DefaultGraphOnly,
    /// Distinct triples asserted in any graph
    UnionOfAllGraphs,
}

/// Triple store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Cardinality mode for `len(None)`
    pub len_mode: LenMode,
    /// RocksDB directory (None = in-memory only)
    pub data_path: Option<PathBuf>,
    /// Create the database when `data_path` does not exist yet
    pub create: bool,
    /// Fsync every persisted write
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            len_mode: LenMode::DefaultGraphOnly,
            data_path: None,
            create: true,
            sync_writes: false,
        }
    }
}

impl StoreConfig {
    /// Memory-only configuration
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// RocksDB-backed configuration rooted at `path`
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_len_mode(mut self, len_mode: LenMode) -> Self {
        self.len_mode = len_mode;
        self
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
