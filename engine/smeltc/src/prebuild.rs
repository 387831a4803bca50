//! Naming and reuse rules of the content-addressed prebuild store.
//!
//! Every artefact the build produces lives in the prebuild directory under
//! `<stem>.<hash>.<ext>`, where the hash covers everything that determines
//! the artefact's bytes. An artefact is immutable once written: the same
//! hash always means the same content, so finding the file is a build hit.

use std::path::{Path, PathBuf};

use smelt_hash::ContentHash;

use crate::error::BuildError;

/// One compiled translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    pub input_fpath: PathBuf,
    pub output_fpath: PathBuf,
}

/// The uniform artefact naming convention: `<dir>/<stem>.<hash>.<ext>`.
#[must_use]
pub fn prebuild_path(dir: &Path, stem: &str, hash: ContentHash, ext: &str) -> PathBuf {
    dir.join(format!("{stem}.{hash}.{ext}"))
}

/// Produce `path` unless it already exists. Returns true on a cache hit.
///
/// Two workers racing to the same hash both succeed: whoever runs `build`
/// second produces identical bytes, so an existing file is never a conflict.
pub fn get_or_create(
    path: &Path,
    build: impl FnOnce() -> Result<(), BuildError>,
) -> Result<bool, BuildError> {
    if path.exists() {
        return Ok(true);
    }
    build()?;
    Ok(false)
}
