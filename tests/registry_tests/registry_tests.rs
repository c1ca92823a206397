//! Tests for StoreRegistry
//!
//! These tests verify:
//! - Builtin backend names
//! - Opening backends by name
//! - Custom registration and duplicate rejection

use filerstore::registry::StoreRegistry;
use filerstore::store::MemoryStore;
use filerstore::{FilerStore, Result, StoreConfig, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_custom(_config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
    Ok(Box::new(MemoryStore::new()))
}

fn open_failing(config: &StoreConfig) -> Result<Box<dyn FilerStore>> {
    Err(StoreError::Config(format!("{} is unavailable", config.store)))
}

// =============================================================================
// Builtin Tests
// =============================================================================

#[test]
fn test_builtin_names_are_sorted() {
    let registry = StoreRegistry::with_builtin_stores();
    assert_eq!(registry.names(), ["memory", "redb", "sqlite"]);
}

#[test]
fn test_empty_registry() {
    let registry = StoreRegistry::new();
    assert!(registry.names().is_empty());
    assert!(!registry.contains("redb"));
}

#[test]
fn test_open_memory() {
    let registry = StoreRegistry::with_builtin_stores();
    let config = StoreConfig::builder().store("memory").build();

    let store = registry.open(&config).unwrap();
    assert_eq!(store.name(), "memory");
}

#[test]
fn test_open_persistent_backends() {
    let registry = StoreRegistry::with_builtin_stores();

    for name in ["redb", "sqlite"] {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::builder()
            .store(name)
            .dir(temp_dir.path())
            .build();

        let store = registry.open(&config).unwrap();
        assert_eq!(store.name(), name);
        store.shutdown();
    }
}

#[test]
fn test_open_unknown_store() {
    let registry = StoreRegistry::with_builtin_stores();
    let config = StoreConfig::builder().store("leveldb9").build();

    let err = registry.open(&config).err().unwrap();
    assert!(matches!(err, StoreError::UnknownStore(ref name) if name == "leveldb9"));
}

#[test]
fn test_open_propagates_initialization_error() {
    let registry = StoreRegistry::with_builtin_stores();
    let config = StoreConfig::builder().store("redb").build();

    let err = registry.open(&config).err().unwrap();
    assert!(matches!(err, StoreError::Config(_)));
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn test_register_custom_store() {
    let mut registry = StoreRegistry::new();
    registry.register("custom", open_custom).unwrap();

    assert!(registry.contains("custom"));
    let config = StoreConfig::builder().store("custom").build();
    assert!(registry.open(&config).is_ok());
}

#[test]
fn test_register_duplicate_rejected() {
    let mut registry = StoreRegistry::with_builtin_stores();

    let err = registry.register("redb", open_custom).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateStore(ref name) if name == "redb"));
}

#[test]
fn test_factory_error_is_returned() {
    let mut registry = StoreRegistry::new();
    registry.register("flaky", open_failing).unwrap();

    let config = StoreConfig::builder().store("flaky").build();
    let err = registry.open(&config).err().unwrap();
    assert_eq!(err.to_string(), "Configuration error: flaky is unavailable");
}
