//! Ordered KV Module
//!
//! The engine contract the KV-backed filer store is written against.
//!
//! ## Responsibilities
//! - Point get/put/delete over byte-string keys
//! - Ascending range cursors starting at a lower bound
//! - Internal thread safety (every method takes `&self`)
//!
//! ## Cursor Lifetime
//! A cursor pins whatever the engine needs for a consistent scan, a map
//! snapshot or a read transaction. Dropping the cursor releases it, so any
//! way out of a scan frees it.

mod memory;
mod redb;

pub use self::memory::{MemoryCursor, MemoryKv};
pub use self::redb::{RedbCursor, RedbKv};

use bytes::Bytes;

use crate::error::EngineError;

/// Result type for engine calls
pub type KvResult<T> = std::result::Result<T, EngineError>;

/// Embedded engine with lexicographically ordered keys
pub trait OrderedKv: Send + Sync {
    /// Ascending iterator over `(key, value)` pairs, released on drop
    type Cursor<'a>: Iterator<Item = KvResult<(Bytes, Bytes)>>
    where
        Self: 'a;

    /// Read a value. `Ok(None)` means the key is absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>>;

    /// Write a value, replacing any previous one
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Remove a key. Removing an absent key succeeds.
    fn delete(&self, key: &[u8]) -> KvResult<()>;

    /// Open a cursor over all keys `>= start`
    fn range_from(&self, start: &[u8]) -> KvResult<Self::Cursor<'_>>;

    /// Flush and release engine resources
    fn close(&self) -> KvResult<()> {
        Ok(())
    }
}
