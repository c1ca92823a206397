//! Store Registry
//!
//! Name → factory table used to pick a backend at startup. Built explicitly
//! and passed by reference; there is no process-wide list.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::store::{FilerStore, MemoryStore, RedbStore, SqliteStore};

/// Opens a store from its configuration
pub type StoreFactory = fn(&StoreConfig) -> Result<Box<dyn FilerStore>>;

/// Available filer store backends, keyed by name
#[derive(Default)]
pub struct StoreRegistry {
    factories: BTreeMap<&'static str, StoreFactory>,
}

impl StoreRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend shipped in this crate
    pub fn with_builtin_stores() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(RedbStore::NAME, open_redb);
        registry.factories.insert(SqliteStore::NAME, open_sqlite);
        registry.factories.insert(MemoryStore::NAME, open_memory);
        registry
    }

    /// Add a backend; names must be unique
    pub fn register(&mut self, name: &'static str, factory: StoreFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(StoreError::DuplicateStore(name.to_string()));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Registered names in ascending order
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Open the backend named by `config.store`
    pub fn open(&self, config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
        let factory = self
            .factories
            .get(config.store.as_str())
            .ok_or_else(|| StoreError::UnknownStore(config.store.clone()))?;

        let store = factory(config)?;
        info!("configured filer store to {}", store.name());
        Ok(store)
    }
}

fn open_redb(config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
    Ok(Box::new(RedbStore::initialize(config)?))
}

fn open_sqlite(config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
    Ok(Box::new(SqliteStore::initialize(config)?))
}

fn open_memory(_config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
    Ok(Box::new(MemoryStore::new()))
}
