//! In-memory ordered KV engine
//!
//! BTreeMap behind a `parking_lot::RwLock`, copy-on-write:
//! - Writers mutate through `Arc::make_mut`, which only clones the map while a
//!   cursor still holds the previous version
//! - Cursors take an `Arc` snapshot, so a scan sees a point-in-time view and
//!   never blocks writers

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use super::{KvResult, OrderedKv};

type Map = BTreeMap<Vec<u8>, Bytes>;

/// In-memory engine, used by the `memory` store and in tests
#[derive(Default)]
pub struct MemoryKv {
    data: RwLock<Arc<Map>>,
}

impl MemoryKv {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl OrderedKv for MemoryKv {
    type Cursor<'a> = MemoryCursor;

    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let mut data = self.data.write();
        Arc::make_mut(&mut data).insert(key.to_vec(), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        let mut data = self.data.write();
        if data.contains_key(key) {
            Arc::make_mut(&mut data).remove(key);
        }
        Ok(())
    }

    fn range_from(&self, start: &[u8]) -> KvResult<MemoryCursor> {
        Ok(MemoryCursor {
            snapshot: Arc::clone(&self.data.read()),
            next_from: Bound::Included(start.to_vec()),
        })
    }
}

/// Cursor over a snapshot of a [`MemoryKv`]
pub struct MemoryCursor {
    snapshot: Arc<Map>,
    /// Lower bound of the next step; becomes `Excluded(last key)` as we go
    next_from: Bound<Vec<u8>>,
}

impl Iterator for MemoryCursor {
    type Item = KvResult<(Bytes, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        let lower: Bound<&[u8]> = match &self.next_from {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };

        let (key, value) = self
            .snapshot
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()?;

        let item = (Bytes::copy_from_slice(key), value.clone());
        self.next_from = Bound::Excluded(key.clone());
        Some(Ok(item))
    }
}
