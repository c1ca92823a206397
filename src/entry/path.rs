//! Full paths
//!
//! A filesystem path split into the directory part (hashed into the key
//! prefix) and the file name (stored raw as the key suffix).

use std::fmt;

/// Full hierarchical path of an entry, e.g. `/home/chris/notes.txt`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FullPath(String);

impl FullPath {
    /// Join a directory and a file name with exactly one separator
    pub fn new(dir: &str, name: &str) -> Self {
        if dir.ends_with('/') {
            FullPath(format!("{dir}{name}"))
        } else {
            FullPath(format!("{dir}/{name}"))
        }
    }

    /// Split into (directory, name)
    ///
    /// The directory loses its trailing slash except for the root:
    /// - `/a/b.txt` → (`/a`, `b.txt`)
    /// - `/b.txt`   → (`/`, `b.txt`)
    /// - `/`        → (`/`, ``)
    /// - `b.txt`    → (`/`, ``)
    pub fn dir_and_name(&self) -> (&str, &str) {
        match self.0.rfind('/') {
            Some(0) => ("/", &self.0[1..]),
            Some(idx) => (&self.0[..idx], &self.0[idx + 1..]),
            None => ("/", ""),
        }
    }

    /// Last path component
    pub fn name(&self) -> &str {
        self.dir_and_name().1
    }

    /// Directory containing this path
    pub fn parent(&self) -> &str {
        self.dir_and_name().0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FullPath {
    fn from(s: &str) -> Self {
        FullPath(s.to_string())
    }
}

impl From<String> for FullPath {
    fn from(s: String) -> Self {
        FullPath(s)
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
