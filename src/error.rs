//! Error types for filerstore
//!
//! Three layers, each with its own enum:
//! - [`EngineError`]: failures raised by the wrapped storage engine
//! - [`CodecError`]: failures raised while (de)serializing entry payloads
//! - [`StoreError`]: what store operations return, always carrying the
//!   path or operation that failed

use std::path::PathBuf;

use thiserror::Error;

use crate::entry::FullPath;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by an underlying storage engine (redb, SQLite, memory)
#[derive(Debug, Error)]
pub enum EngineError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Redb Errors
    // -------------------------------------------------------------------------
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(Box<redb::TransactionError>),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    // -------------------------------------------------------------------------
    // SQLite Errors
    // -------------------------------------------------------------------------
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // -------------------------------------------------------------------------
    // Generic
    // -------------------------------------------------------------------------
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl From<redb::TransactionError> for EngineError {
    fn from(e: redb::TransactionError) -> Self {
        Self::RedbTransaction(Box::new(e))
    }
}

/// Errors raised by the entry payload codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("payload truncated: {len} bytes")]
    Truncated { len: usize },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Checksum { expected: u32, actual: u32 },
}

/// Unified error type for filer store operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("initialize {store} store in {}: {source}", .dir.display())]
    Initialization {
        store: &'static str,
        dir: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unknown filer store: {0}")]
    UnknownStore(String),

    #[error("filer store already registered: {0}")]
    DuplicateStore(String),

    // -------------------------------------------------------------------------
    // Payload Errors
    // -------------------------------------------------------------------------
    #[error("encoding {path}: {source}")]
    Encoding {
        path: FullPath,
        #[source]
        source: CodecError,
    },

    #[error("decode {path}: {source}")]
    Decoding {
        path: FullPath,
        #[source]
        source: CodecError,
    },

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("{path}: not found")]
    NotFound { path: FullPath },

    #[error("{op} {path}: {source}")]
    Persistence {
        op: &'static str,
        path: FullPath,
        #[source]
        source: EngineError,
    },

    #[error("{op} {path}: {source}")]
    Retrieval {
        op: &'static str,
        path: FullPath,
        #[source]
        source: EngineError,
    },

    #[error("{op} transaction: {source}")]
    Transaction {
        op: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("transaction {txn_id} is not active")]
    InactiveTransaction { txn_id: u64 },

    #[error("{op}: store busy with transaction {active}")]
    TransactionBusy { op: &'static str, active: u64 },
}

impl StoreError {
    /// True for the expected "no such entry" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn persistence(op: &'static str, path: &FullPath, source: EngineError) -> Self {
        StoreError::Persistence {
            op,
            path: path.clone(),
            source,
        }
    }

    pub(crate) fn retrieval(op: &'static str, path: &FullPath, source: EngineError) -> Self {
        StoreError::Retrieval {
            op,
            path: path.clone(),
            source,
        }
    }
}
