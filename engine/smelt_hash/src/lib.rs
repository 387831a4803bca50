//! Stable content hashing for incremental builds.
//!
//! Every prebuilt artefact (object file, module interface, analysis record)
//! is addressed by a hash of the inputs that determined it. Those hashes end
//! up in filenames on disk and must therefore be identical across process
//! runs and across machines for the same logical inputs. `std`'s default
//! `Hasher` is randomly seeded per process, so this crate carries its own
//! fixed-constant 64-bit hasher instead.

use std::fs::File;
use std::hash::Hasher;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

mod stable;

pub use stable::StableHasher;

/// A 64-bit content hash.
///
/// Formats as 16 lowercase hex digits; that rendering is embedded in
/// prebuild filenames (`foo.1ff6e93b2a04c511.o`), so it must never change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ContentHash(u64);

impl ContentHash {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Format as a fixed-width hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Parse from a hex string, as produced by [`ContentHash::to_hex`].
    pub fn from_hex(s: &str) -> Option<Self> {
        u64::from_str_radix(s, 16).ok().map(Self)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hash a file's raw content.
pub fn file_checksum(path: &Path) -> Result<ContentHash, HashError> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HashError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            HashError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })?;

    let mut hasher = StableHasher::default();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer).map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        // Feed raw bytes. Slice `Hash` prefixes each write with a
        // native-endian length word, which would make the digest depend on
        // read-chunk boundaries and on the machine.
        hasher.write(&buffer[..n]);
    }
    Ok(ContentHash(hasher.finish()))
}

/// Hash a string directly.
#[must_use]
pub fn string_checksum(s: &str) -> ContentHash {
    hash_bytes(s.as_bytes())
}

/// Hash raw bytes directly.
///
/// Used for hashing serialized data (e.g. bincode-encoded analysis records).
#[must_use]
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    let mut hasher = StableHasher::default();
    hasher.write(data);
    ContentHash(hasher.finish())
}

/// Combine multiple hashes into one. Order-sensitive.
///
/// Callers that combine hashes of unordered collections must sort first;
/// combo-hashes feed artefact filenames and may not depend on map iteration
/// order.
#[must_use]
pub fn combine_hashes(hash_list: &[ContentHash]) -> ContentHash {
    let mut state = StableHasher::default();
    for hash in hash_list {
        // Fixed endianness for the same reason as the byte feeds above.
        state.write(&hash.0.to_le_bytes());
    }
    ContentHash(state.finish())
}

/// Error during hashing.
#[derive(Debug, Clone)]
pub enum HashError {
    /// I/O error reading a file.
    Io { path: PathBuf, message: String },
    /// File not found.
    NotFound { path: PathBuf },
}

impl HashError {
    /// The path the failure relates to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::NotFound { path } => path,
        }
    }
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read '{}': {}", path.display(), message)
            }
            Self::NotFound { path } => {
                write!(f, "file not found: '{}'", path.display())
            }
        }
    }
}

impl std::error::Error for HashError {}

#[cfg(test)]
mod tests;
