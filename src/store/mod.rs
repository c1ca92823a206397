//! Store Module
//!
//! The storage-abstraction contract every filer metadata backend implements.
//!
//! ## Backends
//! ```text
//!                    ┌──────────────────────┐
//!                    │   dyn FilerStore     │
//!                    └──────────┬───────────┘
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!   ┌─────────────────────┐           ┌─────────────────────┐
//!   │ KvFilerStore<E>     │           │    SqliteStore      │
//!   │ (hashed-dir keys)   │           │ (filemeta table)    │
//!   └──────────┬──────────┘           └─────────────────────┘
//!        ┌─────┴──────┐
//!        ▼            ▼
//!   ┌─────────┐  ┌─────────┐
//!   │ RedbKv  │  │MemoryKv │
//!   └─────────┘  └─────────┘
//! ```
//!
//! Backends are selected by name through [`crate::registry::StoreRegistry`].

mod kv;
mod sqlite;

pub use kv::{KvFilerStore, MemoryStore, RedbStore};
pub use sqlite::SqliteStore;

use std::fs;
use std::io;
use std::path::Path;

use crate::entry::{Entry, FullPath};
use crate::error::{Result, StoreError};

/// Transaction handle threaded through every store call
///
/// `TxnContext::none()` is the no-op context. Backends without multi-key
/// atomicity hand it back unchanged from `begin_transaction`, so callers must
/// not assume isolation across operations on those backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxnContext {
    txn_id: Option<u64>,
}

impl TxnContext {
    /// Context outside of any transaction
    pub const fn none() -> Self {
        Self { txn_id: None }
    }

    /// Context bound to an open backend transaction
    pub const fn with_id(txn_id: u64) -> Self {
        Self {
            txn_id: Some(txn_id),
        }
    }

    pub fn txn_id(&self) -> Option<u64> {
        self.txn_id
    }

    pub fn is_active(&self) -> bool {
        self.txn_id.is_some()
    }
}

/// Result of a directory listing
///
/// A listing can fail halfway: `entries` then holds everything accepted
/// before the failure and `error` says why the scan stopped.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub entries: Vec<Entry>,
    pub error: Option<StoreError>,
}

impl DirectoryListing {
    /// Drop the partial entries if the scan failed
    pub fn into_result(self) -> Result<Vec<Entry>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.entries),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// File names of the returned entries, in listing order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.full_path.name()).collect()
    }
}

/// Path-indexed metadata store
///
/// Every data operation takes the caller's [`TxnContext`]. Single-record
/// mutations are atomic on every backend; nothing else is promised unless the
/// backend opens real transactions.
pub trait FilerStore: Send + Sync {
    /// Registry name of this backend
    fn name(&self) -> &'static str;

    // =========================================================================
    // Transactions
    // =========================================================================

    fn begin_transaction(&self, ctx: TxnContext) -> Result<TxnContext>;

    fn commit_transaction(&self, ctx: &TxnContext) -> Result<()>;

    fn rollback_transaction(&self, ctx: &TxnContext) -> Result<()>;

    // =========================================================================
    // Entries
    // =========================================================================

    /// Write an entry, replacing any record at the same path
    fn insert_entry(&self, ctx: &TxnContext, entry: &Entry) -> Result<()>;

    /// Replace an entry wholesale; same semantics as insert
    fn update_entry(&self, ctx: &TxnContext, entry: &Entry) -> Result<()> {
        self.insert_entry(ctx, entry)
    }

    /// Load the entry at `path`, `StoreError::NotFound` if absent
    fn find_entry(&self, ctx: &TxnContext, path: &FullPath) -> Result<Entry>;

    /// Remove the entry at `path`; absent paths are not an error
    fn delete_entry(&self, ctx: &TxnContext, path: &FullPath) -> Result<()>;

    /// List the children of `dir` in ascending name order
    ///
    /// Starts at `start_file_name` (empty = from the beginning), skipping it
    /// unless `inclusive`, and returns at most `limit` entries.
    fn list_directory_entries(
        &self,
        ctx: &TxnContext,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: i64,
    ) -> DirectoryListing;

    /// Flush and close the underlying engine
    fn shutdown(&self) {}
}

/// Make sure `dir` exists, is a directory, and accepts new files
pub(crate) fn check_dir_writable(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    if !fs::metadata(dir)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dir.display()),
        ));
    }

    let probe = dir.join(".filerstore-write-check");
    fs::write(&probe, b"")?;
    fs::remove_file(&probe)
}
