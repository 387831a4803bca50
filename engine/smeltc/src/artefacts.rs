//! What each build step produces, for the steps after it.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};

use smelt_tree::BuildTree;

/// Which target a collection belongs to. `None` is the unnamed tree of a
/// library build.
pub type TargetKey = Option<String>;

/// Process-scoped store of the artefacts produced so far in one build run.
///
/// Created empty, reset between runs, never shared across builds.
#[derive(Debug, Default)]
pub struct ArtefactStore {
    /// One build tree per root symbol, from the analyse step.
    pub build_trees: FxHashMap<TargetKey, BuildTree>,
    /// Objects produced per target by the compile steps.
    pub object_files: FxHashMap<TargetKey, BTreeSet<PathBuf>>,
    /// Archives produced per target.
    pub object_archives: FxHashMap<TargetKey, BTreeSet<PathBuf>>,
    /// Linked executables.
    pub executables: Vec<PathBuf>,
    /// Prebuild files the current run depends on; the cleanup step must
    /// never delete these.
    pub current_prebuilds: FxHashSet<PathBuf>,
}

impl ArtefactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add_object_file(&mut self, target: &TargetKey, object: PathBuf) {
        self.object_files
            .entry(target.clone())
            .or_default()
            .insert(object);
    }

    pub fn add_current_prebuilds(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.current_prebuilds.extend(paths);
    }
}
