//! Configuration for filerstore
//!
//! Centralized configuration with sensible defaults. Loadable from TOML:
//!
//! ```toml
//! store = "redb"
//! dir = "./filerdb"
//! block_cache_capacity = 33554432
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StoreError};

/// Store selected when nothing else is configured
pub const DEFAULT_STORE: &str = "redb";

/// Configuration of one filer store instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Backend Selection
    // -------------------------------------------------------------------------
    /// Registry name of the backend (`redb`, `sqlite`, `memory`)
    pub store: String,

    /// Directory holding the engine's on-disk files
    /// Required by every persistent backend.
    pub dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Engine Tunables
    // -------------------------------------------------------------------------
    /// Block/page cache budget in bytes
    pub block_cache_capacity: usize,

    /// In-memory write buffer before flushing, in bytes
    pub write_buffer_size: usize,

    /// Growth factor of table sizes across compaction levels
    pub compaction_table_size_multiplier: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store: DEFAULT_STORE.to_string(),
            dir: None,
            block_cache_capacity: 32 * 1024 * 1024, // 32 MB
            write_buffer_size: 16 * 1024 * 1024,    // 16 MB
            compaction_table_size_multiplier: 10,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// The `dir` option, or a configuration error naming the store
    pub fn require_dir(&self) -> Result<&Path> {
        match self.dir.as_deref() {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
            _ => Err(StoreError::Config(format!(
                "store {} requires a dir",
                self.store
            ))),
        }
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Select the backend by registry name
    pub fn store(mut self, name: impl Into<String>) -> Self {
        self.config.store = name.into();
        self
    }

    /// Set the data directory
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dir = Some(path.into());
        self
    }

    /// Set the cache budget (in bytes)
    pub fn block_cache_capacity(mut self, bytes: usize) -> Self {
        self.config.block_cache_capacity = bytes;
        self
    }

    /// Set the write buffer size (in bytes)
    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.config.write_buffer_size = bytes;
        self
    }

    pub fn compaction_table_size_multiplier(mut self, factor: usize) -> Self {
        self.config.compaction_table_size_multiplier = factor;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
