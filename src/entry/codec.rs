//! Entry payload codec
//!
//! ## Payload Format
//! ```text
//! ┌──────────┬──────────────────────────────────────────┐
//! │ CRC (4)  │ bincode((Attributes, Vec<FileChunk>))    │
//! └──────────┴──────────────────────────────────────────┘
//! ```
//! The CRC32 is big-endian and covers the bincode body only.

use crate::error::CodecError;

use super::{Attributes, FileChunk};

/// Checksum prefix size
pub const CRC_SIZE: usize = 4;

/// Encode attributes and chunks into a checksummed payload
pub fn encode_payload(attr: &Attributes, chunks: &[FileChunk]) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(&(attr, chunks))?;
    let crc = crc32fast::hash(&body);

    let mut payload = Vec::with_capacity(CRC_SIZE + body.len());
    payload.extend_from_slice(&crc.to_be_bytes());
    payload.extend_from_slice(&body);
    Ok(payload)
}

/// Decode a payload produced by [`encode_payload`]
pub fn decode_payload(data: &[u8]) -> Result<(Attributes, Vec<FileChunk>), CodecError> {
    if data.len() < CRC_SIZE {
        return Err(CodecError::Truncated { len: data.len() });
    }

    let (crc_bytes, body) = data.split_at(CRC_SIZE);
    let expected = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(CodecError::Checksum { expected, actual });
    }

    Ok(bincode::deserialize(body)?)
}
