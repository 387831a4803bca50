//! The per-build configuration every step receives.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use smelt_tools::{Category, Flags, ToolBox, ToolRepository};

use crate::artefacts::ArtefactStore;
use crate::error::BuildError;

/// One build of one project: label, workspace layout, selected tools and
/// feature switches. Steps take `&mut BuildConfig` and communicate through
/// its artefact store.
#[derive(Debug)]
pub struct BuildConfig {
    pub project_label: String,
    pub toolbox: ToolBox,
    pub openmp: bool,
    pub mpi: bool,
    /// Flag profile to resolve tool flags with; `None` is the default
    /// profile.
    pub profile: Option<String>,
    /// Worker count for parallel sections; `None` uses the rayon default,
    /// `Some(1)` forces sequential passes.
    pub jobs: Option<usize>,
    pub artefacts: ArtefactStore,
    workspace: PathBuf,
}

impl BuildConfig {
    #[must_use]
    pub fn new(project_label: &str, workspace: &Path, toolbox: ToolBox) -> Self {
        Self {
            project_label: project_label.to_string(),
            toolbox,
            openmp: false,
            mpi: false,
            profile: None,
            jobs: None,
            artefacts: ArtefactStore::new(),
            workspace: workspace.to_path_buf(),
        }
    }

    #[must_use]
    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or("")
    }

    /// `<workspace>/<label>`, with spaces underscored so the label can be a
    /// human-readable project name.
    #[must_use]
    pub fn project_workspace(&self) -> PathBuf {
        self.workspace.join(self.project_label.replace(' ', "_"))
    }

    #[must_use]
    pub fn build_output(&self) -> PathBuf {
        self.project_workspace().join("build_output")
    }

    #[must_use]
    pub fn prebuild_folder(&self) -> PathBuf {
        self.build_output().join("_prebuild")
    }

    /// Fill empty toolbox slots with the repository defaults for this
    /// build's MPI setting. Explicit selections are kept, so a build can
    /// pin one tool and default the rest.
    pub fn select_default_tools(&mut self, repo: &ToolRepository) -> Result<(), BuildError> {
        for category in [
            Category::FortranCompiler,
            Category::CCompiler,
            Category::Linker,
            Category::Archiver,
        ] {
            if !self.toolbox.contains(category) {
                self.toolbox.add_tool(repo.get_default(category, self.mpi)?);
            }
        }
        Ok(())
    }

    /// Create the workspace directories and reset the artefact store.
    /// Call once before running any step.
    pub fn prepare(&mut self) -> Result<(), BuildError> {
        let prebuild = self.prebuild_folder();
        fs::create_dir_all(&prebuild).map_err(|e| BuildError::Io {
            path: prebuild.clone(),
            message: e.to_string(),
        })?;
        self.artefacts.reset();
        info!(project = %self.project_label, workspace = %self.project_workspace().display(), "prepared build");
        Ok(())
    }
}

/// Run `op` on a pool of `jobs` workers, or the global pool when unset.
/// A pool that fails to build degrades to the global pool with a warning.
pub(crate) fn with_jobs<R: Send>(jobs: Option<usize>, op: impl FnOnce() -> R + Send) -> R {
    let pool = jobs.and_then(|n| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|err| warn!(%err, "falling back to the global worker pool"))
            .ok()
    });
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Extra flags applied to the files matching a path pattern. The pattern
/// matches exactly, or as a prefix when it ends with `*`.
#[derive(Debug, Clone)]
pub struct AddFlags {
    pub match_pattern: String,
    pub flags: Vec<String>,
}

impl AddFlags {
    fn matches(&self, fpath: &Path) -> bool {
        let fpath = fpath.to_string_lossy();
        match self.match_pattern.strip_suffix('*') {
            Some(prefix) => fpath.starts_with(prefix),
            None => fpath == self.match_pattern,
        }
    }
}

/// Compile flags: a common list plus per-path additions.
#[derive(Debug, Clone, Default)]
pub struct FlagsConfig {
    pub common_flags: Vec<String>,
    pub path_flags: Vec<AddFlags>,
}

impl FlagsConfig {
    /// The effective flags for one source file, with `$source` and
    /// `$output` placeholders substituted.
    #[must_use]
    pub fn flags_for_path(&self, fpath: &Path, source_root: &Path, output: &Path) -> Flags {
        let mut flags: Flags = self.common_flags.iter().cloned().collect();
        for add in &self.path_flags {
            if add.matches(fpath) {
                flags.extend(add.flags.iter().map(|f| {
                    f.replace("$source", &source_root.to_string_lossy())
                        .replace("$output", &output.to_string_lossy())
                }));
            }
        }
        flags
    }
}
