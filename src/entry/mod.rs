//! Entry Module
//!
//! One filesystem node (file or directory) as the filer sees it.
//!
//! ## Responsibilities
//! - Identify a node by its [`FullPath`]
//! - Carry the node's attributes and content chunk list
//! - Encode/decode attributes + chunks into the opaque payload a store persists
//!
//! The path is never part of the payload: stores derive it from the key.

mod codec;
mod path;

pub use codec::{decode_payload, encode_payload};
pub use path::FullPath;

use serde::{Deserialize, Serialize};

/// Mode bit marking a directory (same position as Go's `os.ModeDir`)
pub const MODE_DIR: u32 = 1 << 31;

/// Metadata of a node, opaque to the store layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Last modification time (unix seconds)
    pub mtime: i64,

    /// Creation time (unix seconds)
    pub crtime: i64,

    /// Permission and type bits
    pub mode: u32,

    pub uid: u32,
    pub gid: u32,

    pub mime: String,
    pub replication: String,
    pub collection: String,

    /// Time-to-live in seconds, 0 means forever
    pub ttl_sec: i32,

    pub user_name: String,
    pub group_names: Vec<String>,
}

/// Reference to one stored piece of a file's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    /// Volume server file id, e.g. `3,01637037d6`
    pub file_id: String,

    /// Offset of this chunk inside the file
    pub offset: i64,

    pub size: u64,

    /// Modification time (unix nanos) used to resolve overlapping chunks
    pub mtime: i64,

    pub e_tag: String,
}

/// A filesystem node: path + attributes + chunks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub full_path: FullPath,
    pub attr: Attributes,
    pub chunks: Vec<FileChunk>,
}

impl Entry {
    /// Create an entry with empty attributes and no chunks
    pub fn new(full_path: impl Into<FullPath>) -> Self {
        Self {
            full_path: full_path.into(),
            ..Default::default()
        }
    }

    /// Split the entry's path into (directory, name)
    pub fn dir_and_name(&self) -> (&str, &str) {
        self.full_path.dir_and_name()
    }

    pub fn is_directory(&self) -> bool {
        self.attr.mode & MODE_DIR != 0
    }

    /// Logical file size: the furthest byte any chunk reaches
    pub fn size(&self) -> u64 {
        self.chunks
            .iter()
            .map(|c| (c.offset.max(0) as u64).saturating_add(c.size))
            .max()
            .unwrap_or(0)
    }

    /// Serialize attributes and chunks into a store payload
    pub fn encode_attributes_and_chunks(&self) -> Result<Vec<u8>, crate::error::CodecError> {
        encode_payload(&self.attr, &self.chunks)
    }

    /// Replace attributes and chunks with the ones decoded from `data`
    ///
    /// On failure the entry is left untouched apart from its path.
    pub fn decode_attributes_and_chunks(
        &mut self,
        data: &[u8],
    ) -> Result<(), crate::error::CodecError> {
        let (attr, chunks) = decode_payload(data)?;
        self.attr = attr;
        self.chunks = chunks;
        Ok(())
    }
}
