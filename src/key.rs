//! Key Encoder
//!
//! Maps `(directory, file name)` onto a flat ordered key space.
//!
//! ## Key Format
//! ```text
//! ┌────────────────────────┬──────────────────────────┐
//! │ MD5(directory) (16)    │ file name (raw UTF-8)    │
//! └────────────────────────┴──────────────────────────┘
//! ```
//!
//! Every entry of one directory shares the same 16-byte prefix, so a
//! directory listing is a single contiguous range scan. Keys of different
//! directories interleave in hash order.
//!
//! Two distinct directories whose paths collide under MD5 would share a
//! prefix and see each other's files. That risk is accepted.

/// Width of the directory fingerprint prefix
pub const DIR_HASH_LEN: usize = 16;

/// Fingerprint a directory path
pub fn hash_to_bytes(dir: &str) -> [u8; DIR_HASH_LEN] {
    md5::compute(dir.as_bytes()).0
}

/// Storage key of `name` inside `dir`
pub fn gen_key(dir: &str, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(DIR_HASH_LEN + name.len());
    key.extend_from_slice(&hash_to_bytes(dir));
    key.extend_from_slice(name.as_bytes());
    key
}

/// Scan lower bound for listing `dir` from `start_file_name`
///
/// With an empty start name this is the bare directory prefix.
pub fn gen_directory_key_prefix(dir: &str, start_file_name: &str) -> Vec<u8> {
    gen_key(dir, start_file_name)
}

/// Recover the file name from a key built by [`gen_key`]
///
/// Returns `None` for keys shorter than the fingerprint.
pub fn name_from_key(key: &[u8]) -> Option<String> {
    key.get(DIR_HASH_LEN..)
        .map(|name| String::from_utf8_lossy(name).into_owned())
}
