//! Redb-backed ordered KV engine
//!
//! One table of raw byte keys to raw byte values inside `{dir}/filer.redb`.
//! Every put/delete is its own write transaction, which makes single-key
//! writes atomic and durable on commit. Cursors own a read transaction, so a
//! scan observes the snapshot taken when it was opened.

use std::ops::Bound;
use std::path::Path;

use bytes::Bytes;
use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition};
use tracing::debug;

use super::{KvResult, OrderedKv};

/// File name of the database inside the store directory
pub const DB_FILENAME: &str = "filer.redb";

const ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("filer_entries");

/// Embedded engine persisting to a single redb file
pub struct RedbKv {
    db: Database,
}

impl RedbKv {
    /// Open (or create) the database inside `dir`
    ///
    /// `cache_size` is the page cache budget in bytes.
    pub fn open(dir: &Path, cache_size: usize) -> KvResult<Self> {
        let path = dir.join(DB_FILENAME);
        debug!(path = %path.display(), cache_size, "opening redb");

        let db = redb::Builder::new()
            .set_cache_size(cache_size)
            .create(&path)?;

        // Create the table eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(ENTRIES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl OrderedKv for RedbKv {
    type Cursor<'a> = RedbCursor;

    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        let value = table.get(key)?;
        Ok(value.map(|v| Bytes::copy_from_slice(v.value())))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn range_from(&self, start: &[u8]) -> KvResult<RedbCursor> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        Ok(RedbCursor {
            table,
            next_from: Bound::Included(start.to_vec()),
            done: false,
        })
    }
}

/// Cursor over a read snapshot of a [`RedbKv`]
///
/// Each step seeks from the last returned key, so the cursor holds no
/// borrow into the table between steps.
pub struct RedbCursor {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
    next_from: Bound<Vec<u8>>,
    done: bool,
}

impl RedbCursor {
    fn step(&mut self) -> KvResult<Option<(Bytes, Bytes)>> {
        let lower: Bound<&[u8]> = match &self.next_from {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };

        let mut range = self.table.range::<&[u8]>((lower, Bound::Unbounded))?;
        let Some(item) = range.next() else {
            return Ok(None);
        };
        let (key, value) = item?;
        let key = key.value().to_vec();
        let value = Bytes::copy_from_slice(value.value());
        drop(range);

        self.next_from = Bound::Excluded(key.clone());
        Ok(Some((Bytes::from(key), value)))
    }
}

impl Iterator for RedbCursor {
    type Item = KvResult<(Bytes, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
