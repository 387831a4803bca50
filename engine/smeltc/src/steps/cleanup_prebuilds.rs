//! Housekeeping for the prebuild store.
//!
//! The store only ever grows during builds; this step applies a retention
//! policy. Whatever the policy says, a file the current run depends on is
//! never deleted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::error::BuildError;

#[derive(Debug, Clone, Default)]
pub struct CleanupArgs {
    /// Delete prebuild files unused for at least this long.
    pub older_than: Option<Duration>,
    /// Keep at most this many hash-variants of each logical file.
    pub n_versions: Option<usize>,
}

/// Apply the retention policy. With no policy at all, everything the
/// current run does not use is removed. Returns the number of files
/// deleted.
pub fn cleanup_prebuilds(
    config: &mut BuildConfig,
    args: &CleanupArgs,
) -> Result<usize, BuildError> {
    let prebuild_dir = config.prebuild_folder();
    let files = list_files(&prebuild_dir)?;
    let current = &config.artefacts.current_prebuilds;

    let mut doomed: FxHashSet<PathBuf> =
        if args.older_than.is_none() && args.n_versions.is_none() {
            files.iter().cloned().collect()
        } else {
            let mut doomed = FxHashSet::default();
            if let Some(age) = args.older_than {
                doomed.extend(by_age(&files, age));
            }
            if let Some(keep) = args.n_versions {
                doomed.extend(by_version(&files, keep));
            }
            doomed
        };
    doomed.retain(|path| !current.contains(path));

    let mut deleted = 0usize;
    for path in &doomed {
        match fs::remove_file(path) {
            Ok(()) => deleted += 1,
            Err(err) => warn!(path = %path.display(), %err, "could not delete prebuild file"),
        }
    }
    info!(deleted, kept = files.len() - deleted, "cleaned prebuild store");
    Ok(deleted)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn by_age(files: &[PathBuf], max_age: Duration) -> Vec<PathBuf> {
    let now = SystemTime::now();
    files
        .iter()
        .filter(|path| {
            modified(path)
                .and_then(|mtime| now.duration_since(mtime).ok())
                .is_some_and(|age| age > max_age)
        })
        .cloned()
        .collect()
}

/// For each logical file group, everything but the `keep` most recent
/// variants.
fn by_version(files: &[PathBuf], keep: usize) -> Vec<PathBuf> {
    let mut doomed = Vec::new();
    for (_, mut group) in get_prebuild_file_groups(files) {
        // Newest first.
        group.sort_by_key(|path| std::cmp::Reverse(modified(path)));
        doomed.extend(group.into_iter().skip(keep));
    }
    doomed
}

/// Group prebuild files by stripping the hash component of the name:
/// `foo.1ff6e93b.o` and `foo.2a04c511.o` both belong to `foo.*.o`.
/// Names without a hash component form no group.
fn get_prebuild_file_groups(files: &[PathBuf]) -> FxHashMap<String, Vec<PathBuf>> {
    let mut groups: FxHashMap<String, Vec<PathBuf>> = FxHashMap::default();
    for path in files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() < 3 {
            continue;
        }
        let stem = parts[..parts.len() - 2].join(".");
        let suffix = parts[parts.len() - 1];
        groups
            .entry(format!("{stem}.*.{suffix}"))
            .or_default()
            .push(path.clone());
    }
    groups
}

#[cfg(test)]
mod tests;
