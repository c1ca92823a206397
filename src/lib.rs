//! # filerstore
//!
//! Pluggable metadata stores for a distributed file system's entry catalog:
//! - One [`FilerStore`] contract for path-keyed entries
//! - Interchangeable backends: redb, SQLite, in-memory
//! - Directory listing as an ordered range scan over hashed-directory keys
//! - Name-based backend selection through an explicit [`StoreRegistry`]
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Caller (filer service / CLI)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  FullPath, Entry, TxnContext
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               dyn FilerStore (via StoreRegistry)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ KvFilerStore│          │ SqliteStore │
//!   │ key encoder │          └─────────────┘
//!   └──────┬──────┘
//!          ▼
//!   ┌─────────────┐
//!   │  OrderedKv  │
//!   │ redb/memory │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entry;
pub mod key;
pub mod kv;
pub mod store;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::StoreConfig;
pub use entry::{Attributes, Entry, FileChunk, FullPath};
pub use registry::StoreRegistry;
pub use store::{DirectoryListing, FilerStore, TxnContext};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filerstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
