//! SQLite-backed filer store
//!
//! ## Schema
//! ```text
//! filemeta
//! ┌───────────────┬────────────┬───────────────┬────────────┐
//! │ dirhash (i64) │ name (TEXT)│ directory     │ meta (BLOB)│
//! └───────────────┴────────────┴───────────────┴────────────┘
//!   PRIMARY KEY (dirhash, name)
//! ```
//!
//! `dirhash` is the first 8 bytes of the directory's MD5, big-endian. Lookups
//! also match on `directory`, so two directories sharing a dirhash never see
//! each other's rows on read.
//!
//! ## Transactions
//! All calls share one connection behind a mutex, and at most one transaction
//! is open on it. The store remembers which [`TxnContext`] owns it:
//! - Calls carrying the owner's context run inside the transaction
//! - Calls without a context wait until the transaction ends, then run on
//!   their own (`TransactionBusy` once the busy timeout passes)
//! - Calls carrying any other id fail with `InactiveTransaction`
//!
//! Beginning again with the owner's context joins the transaction through a
//! savepoint. Commit and rollback unwind the innermost level first; only the
//! outermost level issues `COMMIT`/`ROLLBACK`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::entry::{Entry, FullPath};
use crate::error::{EngineError, Result, StoreError};
use crate::key;

use super::{check_dir_writable, DirectoryListing, FilerStore, TxnContext};

/// File name of the database inside the store directory
pub const DB_FILENAME: &str = "filer.db";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS filemeta (
    dirhash   INTEGER NOT NULL,
    name      TEXT    NOT NULL,
    directory TEXT    NOT NULL,
    meta      BLOB    NOT NULL,
    PRIMARY KEY (dirhash, name)
)";

const UPSERT: &str = "INSERT INTO filemeta (dirhash, name, directory, meta) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (dirhash, name) DO UPDATE SET directory = excluded.directory, meta = excluded.meta";

const FIND: &str = "SELECT meta FROM filemeta WHERE dirhash = ?1 AND name = ?2 AND directory = ?3";

const DELETE: &str = "DELETE FROM filemeta WHERE dirhash = ?1 AND name = ?2 AND directory = ?3";

const LIST_EXCLUSIVE: &str = "SELECT name, meta FROM filemeta
    WHERE dirhash = ?1 AND name > ?2 AND directory = ?3 AND name != ''
    ORDER BY name ASC LIMIT ?4";

const LIST_INCLUSIVE: &str = "SELECT name, meta FROM filemeta
    WHERE dirhash = ?1 AND name >= ?2 AND directory = ?3 AND name != ''
    ORDER BY name ASC LIMIT ?4";

/// How long a call without a context waits for another transaction
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Filer store persisted in an SQLite database
pub struct SqliteStore {
    state: Mutex<SqliteState>,
    /// Signalled whenever the open transaction ends
    txn_ended: Condvar,
    next_txn_id: AtomicU64,
    busy_timeout: Duration,
}

struct SqliteState {
    conn: Connection,
    active: Option<ActiveTxn>,
}

/// The transaction currently open on the connection
#[derive(Debug, Clone, Copy)]
struct ActiveTxn {
    id: u64,
    /// 1 for the outermost level, +1 per joined savepoint
    depth: u32,
}

impl SqliteState {
    fn active_id(&self) -> Option<u64> {
        self.active.map(|t| t.id)
    }

    fn execute_txn(&self, op: &'static str, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| StoreError::Transaction {
                op,
                source: e.into(),
            })
    }

    /// Forget the transaction if SQLite already ended it
    fn sync_active(&mut self) -> bool {
        if self.active.is_some() && self.conn.is_autocommit() {
            self.active = None;
            return true;
        }
        false
    }
}

impl SqliteStore {
    pub const NAME: &'static str = "sqlite";

    /// Open the store in `config.dir`
    pub fn initialize(config: &StoreConfig) -> Result<Self> {
        let dir = config.require_dir()?;
        info!("filer store {} dir: {}", Self::NAME, dir.display());

        let init_err = |source: EngineError| StoreError::Initialization {
            store: Self::NAME,
            dir: dir.to_path_buf(),
            source,
        };

        check_dir_writable(dir).map_err(|e| init_err(e.into()))?;

        let conn = Connection::open(dir.join(DB_FILENAME)).map_err(|e| init_err(e.into()))?;

        // Negative cache_size is a budget in KiB
        let cache_kib = (config.block_cache_capacity / 1024) as i64;
        conn.pragma_update(None, "cache_size", -cache_kib)
            .map_err(|e| init_err(e.into()))?;

        Self::with_connection(conn).map_err(|e| init_err(e.into()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let init_err = |source: EngineError| StoreError::Initialization {
            store: Self::NAME,
            dir: ":memory:".into(),
            source,
        };
        let conn = Connection::open_in_memory().map_err(|e| init_err(e.into()))?;
        Self::with_connection(conn).map_err(|e| init_err(e.into()))
    }

    /// Change how long calls wait for another caller's transaction
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(CREATE_TABLE)?;
        Ok(Self {
            state: Mutex::new(SqliteState { conn, active: None }),
            txn_ended: Condvar::new(),
            next_txn_id: AtomicU64::new(1),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Lock the connection on behalf of `ctx`
    ///
    /// Returns once the connection is free for this caller: either `ctx` owns
    /// the open transaction, or `ctx` is empty and no transaction is open.
    fn lock_for(&self, op: &'static str, ctx: &TxnContext) -> Result<MutexGuard<'_, SqliteState>> {
        let deadline = Instant::now() + self.busy_timeout;
        let mut state = self.state.lock();
        let mut timed_out = false;

        loop {
            if state.sync_active() {
                self.txn_ended.notify_all();
            }
            match (ctx.txn_id(), state.active_id()) {
                (Some(id), Some(active)) if id == active => return Ok(state),
                (Some(id), _) => return Err(StoreError::InactiveTransaction { txn_id: id }),
                (None, None) => return Ok(state),
                (None, Some(active)) => {
                    if timed_out {
                        return Err(StoreError::TransactionBusy { op, active });
                    }
                    timed_out = self.txn_ended.wait_until(&mut state, deadline).timed_out();
                }
            }
        }
    }

    /// Write raw bytes as the payload of `path`, bypassing the codec
    ///
    /// Also used to inject corrupt rows when exercising the decode path.
    pub fn put_raw(&self, ctx: &TxnContext, path: &FullPath, meta: &[u8]) -> Result<()> {
        let (dir, name) = path.dir_and_name();
        let state = self.lock_for("persisting", ctx)?;
        state
            .conn
            .execute(UPSERT, params![dir_hash(dir), name, dir, meta])
            .map_err(|e| StoreError::persistence("persisting", path, e.into()))?;
        Ok(())
    }

    /// End one level of the transaction owned by `ctx`
    fn finish_transaction(&self, ctx: &TxnContext, commit: bool) -> Result<()> {
        let Some(txn_id) = ctx.txn_id() else {
            return Ok(());
        };
        let (op, outer_sql) = if commit {
            ("commit", "COMMIT")
        } else {
            ("rollback", "ROLLBACK")
        };

        let mut state = self.state.lock();
        let active = match state.active {
            Some(active) if active.id == txn_id => active,
            _ => return Err(StoreError::InactiveTransaction { txn_id }),
        };

        if active.depth > 1 {
            let savepoint = savepoint_name(active.depth);
            let sql = if commit {
                format!("RELEASE {savepoint}")
            } else {
                format!("ROLLBACK TO {savepoint}; RELEASE {savepoint}")
            };
            state.execute_txn(op, &sql)?;
            state.active = Some(ActiveTxn {
                depth: active.depth - 1,
                ..active
            });
            return Ok(());
        }

        let result = state.execute_txn(op, outer_sql);
        if state.sync_active() {
            debug!(txn_id, op, "sqlite transaction ended");
            self.txn_ended.notify_all();
        }
        result
    }

    fn scan_directory(
        &self,
        state: &SqliteState,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: i64,
        out: &mut Vec<Entry>,
    ) -> Result<()> {
        let dir_path = dir.as_str();
        let retrieval = |e: rusqlite::Error| StoreError::retrieval("list", dir, e.into());
        let sql = if inclusive { LIST_INCLUSIVE } else { LIST_EXCLUSIVE };

        let mut stmt = state.conn.prepare_cached(sql).map_err(retrieval)?;
        let mut rows = stmt
            .query(params![dir_hash(dir_path), start_file_name, dir_path, limit])
            .map_err(retrieval)?;

        while let Some(row) = rows.next().map_err(retrieval)? {
            let name: String = row.get(0).map_err(retrieval)?;
            let meta: Vec<u8> = row.get(1).map_err(retrieval)?;

            let mut entry = Entry::new(FullPath::new(dir_path, &name));
            if let Err(source) = entry.decode_attributes_and_chunks(&meta) {
                warn!("list {} : {}", entry.full_path, source);
                return Err(StoreError::Decoding {
                    path: entry.full_path,
                    source,
                });
            }
            out.push(entry);
        }

        Ok(())
    }
}

fn savepoint_name(depth: u32) -> String {
    format!("filerstore_txn_{depth}")
}

/// 64-bit directory hash used as the leading primary key column
fn dir_hash(dir: &str) -> i64 {
    let digest = key::hash_to_bytes(dir);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head)
}

impl FilerStore for SqliteStore {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn begin_transaction(&self, ctx: TxnContext) -> Result<TxnContext> {
        let mut state = self.lock_for("begin", &ctx)?;

        // Already the owner: join through a savepoint
        if let Some(active) = state.active {
            let depth = active.depth + 1;
            state.execute_txn("begin", &format!("SAVEPOINT {}", savepoint_name(depth)))?;
            state.active = Some(ActiveTxn { depth, ..active });
            return Ok(ctx);
        }

        state.execute_txn("begin", "BEGIN")?;
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        state.active = Some(ActiveTxn {
            id: txn_id,
            depth: 1,
        });
        debug!(txn_id, "sqlite transaction started");
        Ok(TxnContext::with_id(txn_id))
    }

    fn commit_transaction(&self, ctx: &TxnContext) -> Result<()> {
        self.finish_transaction(ctx, true)
    }

    fn rollback_transaction(&self, ctx: &TxnContext) -> Result<()> {
        self.finish_transaction(ctx, false)
    }

    fn insert_entry(&self, ctx: &TxnContext, entry: &Entry) -> Result<()> {
        let meta = entry
            .encode_attributes_and_chunks()
            .map_err(|source| StoreError::Encoding {
                path: entry.full_path.clone(),
                source,
            })?;
        self.put_raw(ctx, &entry.full_path, &meta)?;

        debug!(path = %entry.full_path, chunks = entry.chunks.len(), "saved");
        Ok(())
    }

    fn find_entry(&self, ctx: &TxnContext, path: &FullPath) -> Result<Entry> {
        let (dir, name) = path.dir_and_name();

        let meta: Vec<u8> = {
            let state = self.lock_for("get", ctx)?;
            state
                .conn
                .query_row(FIND, params![dir_hash(dir), name, dir], |row| row.get(0))
                .optional()
                .map_err(|e| StoreError::retrieval("get", path, e.into()))?
                .ok_or_else(|| StoreError::NotFound { path: path.clone() })?
        };

        let mut entry = Entry::new(path.clone());
        entry
            .decode_attributes_and_chunks(&meta)
            .map_err(|source| StoreError::Decoding {
                path: path.clone(),
                source,
            })?;
        Ok(entry)
    }

    fn delete_entry(&self, ctx: &TxnContext, path: &FullPath) -> Result<()> {
        let (dir, name) = path.dir_and_name();
        let state = self.lock_for("delete", ctx)?;
        state
            .conn
            .execute(DELETE, params![dir_hash(dir), name, dir])
            .map_err(|e| StoreError::persistence("delete", path, e.into()))?;
        Ok(())
    }

    fn list_directory_entries(
        &self,
        ctx: &TxnContext,
        dir: &FullPath,
        start_file_name: &str,
        inclusive: bool,
        limit: i64,
    ) -> DirectoryListing {
        let mut listing = DirectoryListing::default();
        if limit <= 0 {
            return listing;
        }

        let state = match self.lock_for("list", ctx) {
            Ok(state) => state,
            Err(e) => {
                listing.error = Some(e);
                return listing;
            }
        };
        if let Err(e) = self.scan_directory(
            &state,
            dir,
            start_file_name,
            inclusive,
            limit,
            &mut listing.entries,
        ) {
            listing.error = Some(e);
        }
        listing
    }
}
