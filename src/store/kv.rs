//! KV-backed filer store
//!
//! Stores each entry under `MD5(directory) ++ name` (see [`crate::key`]) in
//! any [`OrderedKv`] engine. Directory listings are a single ascending range
//! scan over the directory's key prefix.
//!
//! ## Transactions
//! Begin/commit/rollback are no-ops. Each put/delete is atomic in the engine;
//! there is no atomicity across operations.

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::entry::{Entry, FullPath};
use crate::error::{Result, StoreError};
use crate::key;
use crate::kv::{MemoryKv, OrderedKv, RedbKv};

use super::{check_dir_writable, DirectoryListing, FilerStore, TxnContext};

/// Filer store persisted in redb
pub type RedbStore = KvFilerStore<RedbKv>;

/// Filer store living only in memory
pub type MemoryStore = KvFilerStore<MemoryKv>;

/// [`FilerStore`] over an ordered key-value engine
pub struct KvFilerStore<E: OrderedKv> {
    name: &'static str,
    engine: E,
}

impl<E: OrderedKv> KvFilerStore<E> {
    /// Wrap an already opened engine
    pub fn with_engine(name: &'static str, engine: E) -> Self {
        Self { name, engine }
    }

    /// Direct access to the engine (for testing and tooling)
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl KvFilerStore<RedbKv> {
    pub const NAME: &'static str = "redb";

    /// Open the store in `config.dir`
    ///
    /// Steps:
    /// 1. Require a `dir` option
    /// 2. Make sure the directory exists and is writable
    /// 3. Open/create the redb file with the configured cache size
    pub fn initialize(config: &StoreConfig) -> Result<Self> {
        let dir = config.require_dir()?;
        info!("filer store {} dir: {}", Self::NAME, dir.display());

        check_dir_writable(dir).map_err(|e| StoreError::Initialization {
            store: Self::NAME,
            dir: dir.to_path_buf(),
            source: e.into(),
        })?;

        // redb has no memtable or leveled compaction; only the cache applies
        debug!(
            write_buffer_size = config.write_buffer_size,
            compaction_table_size_multiplier = config.compaction_table_size_multiplier,
            "tunables without a redb counterpart are ignored"
        );

        let engine = RedbKv::open(dir, config.block_cache_capacity).map_err(|source| {
            info!("filer store open dir {}: {}", dir.display(), source);
            StoreError::Initialization {
                store: Self::NAME,
                dir: dir.to_path_buf(),
                source,
            }
        })?;

        Ok(Self::with_engine(Self::NAME, engine))
    }
}

impl KvFilerStore<MemoryKv> {
    pub const NAME: &'static str = "memory";

    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::with_engine(Self::NAME, MemoryKv::new())
    }
}

impl Default for KvFilerStore<MemoryKv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: OrderedKv> FilerStore for KvFilerStore<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn begin_transaction(&self, ctx: TxnContext) -> Result<TxnContext> {
        Ok(ctx)
    }

    fn commit_transaction(&self, _ctx: &TxnContext) -> Result<()> {
        Ok(())
    }

    fn rollback_transaction(&self, _ctx: &TxnContext) -> Result<()> {
        Ok(())
    }

    fn insert_entry(&self, _ctx: &TxnContext, entry: &Entry) -> Result<()> {
        let (dir, name) = entry.dir_and_name();
        let key = key::gen_key(dir, name);

        let value = entry
            .encode_attributes_and_chunks()
            .map_err(|source| StoreError::Encoding {
                path: entry.full_path.clone(),
                source,
            })?;

        self.engine
            .put(&key, &value)
            .map_err(|e| StoreError::persistence("persisting", &entry.full_path, e))?;

        debug!(path = %entry.full_path, chunks = entry.chunks.len(), "saved");
        Ok(())
    }

    fn find_entry(&self, _ctx: &TxnContext, path: &FullPath) -> Result<Entry> {
        let (dir, name) = path.dir_and_name();
        let key = key::gen_key(dir, name);

        let data = self
            .engine
            .get(&key)
            .map_err(|e| StoreError::retrieval("get", path, e))?
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;

        let mut entry = Entry::new(path.clone());
        entry
            .decode_attributes_and_chunks(&data)
            .map_err(|source| StoreError::Decoding {
                path: path.clone(),
                source,
            })?;

        Ok(entry)
    }

    fn delete_entry(&self, _ctx: &TxnContext, path: &FullPath) -> Result<()> {
        let (dir, name) = path.dir_and_name();
        let key = key::gen_key(dir, name);

        self.engine
            .delete(&key)
            .map_err(|e| StoreError::persistence("delete", path, e))
    }

    fn list_directory_entries(
        &self,
        _ctx: &TxnContext,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        mut limit: i64,
    ) -> DirectoryListing {
        let mut listing = DirectoryListing::default();
        if limit <= 0 {
            return listing;
        }

        let dir_path = dir.as_str();
        let directory_prefix = key::gen_directory_key_prefix(dir_path, "");
        let start = key::gen_directory_key_prefix(dir_path, start_file_name);

        let cursor = match self.engine.range_from(&start) {
            Ok(cursor) => cursor,
            Err(e) => {
                listing.error = Some(StoreError::retrieval("list", dir, e));
                return listing;
            }
        };

        // The cursor is consumed by the loop and dropped on every exit
        for item in cursor {
            let (key, value) = match item {
                Ok(kv) => kv,
                Err(e) => {
                    listing.error = Some(StoreError::retrieval("list", dir, e));
                    break;
                }
            };

            // Prefixes are contiguous: the first foreign key ends the directory
            if !key.starts_with(&directory_prefix) {
                break;
            }

            let Some(file_name) = key::name_from_key(&key) else {
                continue;
            };
            if file_name.is_empty() {
                continue;
            }
            if file_name == start_file_name && !inclusive {
                continue;
            }

            limit -= 1;
            if limit < 0 {
                break;
            }

            let mut entry = Entry::new(FullPath::new(dir_path, &file_name));
            if let Err(source) = entry.decode_attributes_and_chunks(&value) {
                warn!("list {} : {}", entry.full_path, source);
                listing.error = Some(StoreError::Decoding {
                    path: entry.full_path,
                    source,
                });
                break;
            }
            listing.entries.push(entry);
        }

        listing
    }

    fn shutdown(&self) {
        if let Err(e) = self.engine.close() {
            warn!("filer store {} close: {}", self.name, e);
        }
    }
}
