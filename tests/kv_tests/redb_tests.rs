//! Tests for RedbKv
//!
//! These tests verify:
//! - Database file creation
//! - Point get/put/delete
//! - Range cursors
//! - Persistence across reopen

use filerstore::kv::{OrderedKv, RedbKv};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const CACHE_SIZE: usize = 1024 * 1024;

fn setup_temp_kv() -> (TempDir, RedbKv) {
    let temp_dir = TempDir::new().unwrap();
    let kv = RedbKv::open(temp_dir.path(), CACHE_SIZE).unwrap();
    (temp_dir, kv)
}

fn collect_keys(kv: &RedbKv, start: &[u8]) -> Vec<Vec<u8>> {
    kv.range_from(start)
        .unwrap()
        .map(|item| item.unwrap().0.to_vec())
        .collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_redb_open_creates_file() {
    let (temp, _kv) = setup_temp_kv();
    assert!(temp.path().join("filer.redb").exists());
}

#[test]
fn test_redb_put_get() {
    let (_temp, kv) = setup_temp_kv();

    kv.put(b"hello", b"world").unwrap();

    assert_eq!(kv.get(b"hello").unwrap().as_deref(), Some(&b"world"[..]));
}

#[test]
fn test_redb_get_missing() {
    let (_temp, kv) = setup_temp_kv();
    assert_eq!(kv.get(b"missing").unwrap(), None);
}

#[test]
fn test_redb_delete() {
    let (_temp, kv) = setup_temp_kv();

    kv.put(b"k", b"v").unwrap();
    kv.delete(b"k").unwrap();
    kv.delete(b"k").unwrap();

    assert_eq!(kv.get(b"k").unwrap(), None);
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_redb_range_from() {
    let (_temp, kv) = setup_temp_kv();
    for key in [&b"b"[..], b"d", b"a", b"c"] {
        kv.put(key, key).unwrap();
    }

    assert_eq!(
        collect_keys(&kv, b"b"),
        vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
    );
    assert!(collect_keys(&kv, b"e").is_empty());
}

#[test]
fn test_redb_range_empty_db() {
    let (_temp, kv) = setup_temp_kv();
    assert!(collect_keys(&kv, b"").is_empty());
}

#[test]
fn test_redb_cursor_ignores_later_writes() {
    let (_temp, kv) = setup_temp_kv();
    kv.put(b"a", b"1").unwrap();

    let cursor = kv.range_from(b"").unwrap();
    kv.put(b"b", b"2").unwrap();

    let keys: Vec<Vec<u8>> = cursor.map(|item| item.unwrap().0.to_vec()).collect();
    assert_eq!(keys, vec![b"a".to_vec()]);
}

#[test]
fn test_redb_dropped_cursor_does_not_block_writes() {
    let (_temp, kv) = setup_temp_kv();
    kv.put(b"a", b"1").unwrap();
    kv.put(b"b", b"2").unwrap();

    {
        let mut cursor = kv.range_from(b"").unwrap();
        cursor.next().unwrap().unwrap();
    }

    kv.put(b"c", b"3").unwrap();
    assert_eq!(collect_keys(&kv, b"").len(), 3);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_redb_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let kv = RedbKv::open(temp_dir.path(), CACHE_SIZE).unwrap();
        kv.put(b"durable", b"yes").unwrap();
        kv.close().unwrap();
    }

    let kv = RedbKv::open(temp_dir.path(), CACHE_SIZE).unwrap();
    assert_eq!(kv.get(b"durable").unwrap().as_deref(), Some(&b"yes"[..]));
}
