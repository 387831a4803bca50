//! The per-file analysis results and their on-disk records.
//!
//! Every analysed file gets a record in the prebuild directory named
//! `<stem>.<file_hash>.an`. Because the hash is part of the name, a record is
//! immutable once written: a changed file hashes to a new name and the stale
//! record is simply never looked up again.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use smelt_hash::ContentHash;

/// Common accessors over every analysis result kind.
pub trait Analysed {
    fn fpath(&self) -> &Path;
    fn file_hash(&self) -> ContentHash;
}

/// What a Fortran source file defines and depends on.
///
/// All names are stored lowercase; Fortran is case-insensitive and the
/// resolver matches on the normalised form. Collections are ordered so that
/// serialised records and combined hashes are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysedFortran {
    pub fpath: PathBuf,
    pub file_hash: ContentHash,

    /// Names of `program` units defined here. These become build targets.
    pub program_defs: BTreeSet<String>,
    /// Names of modules defined here, each of which emits a `.mod` file.
    pub module_defs: BTreeSet<String>,
    /// Every globally visible symbol defined here, modules included.
    pub symbol_defs: BTreeSet<String>,
    /// Modules this file `use`s.
    pub module_deps: BTreeSet<String>,
    /// Every symbol this file references, used modules included.
    pub symbol_deps: BTreeSet<String>,
    /// Resolved file-level dependencies, filled in by the resolver.
    pub file_deps: BTreeSet<PathBuf>,
    /// Object names from legacy `DEPENDS ON: foo.o` comments, to be matched
    /// against C sources when trees are merged.
    pub mo_commented_file_deps: BTreeSet<String>,
}

impl AnalysedFortran {
    #[must_use]
    pub fn new(fpath: impl Into<PathBuf>, file_hash: ContentHash) -> Self {
        Self {
            fpath: fpath.into(),
            file_hash,
            ..Self::default()
        }
    }

    /// Record a module definition. Modules are symbols too.
    pub fn add_module_def(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.symbol_defs.insert(name.clone());
        self.module_defs.insert(name);
    }

    /// Record a program definition. Programs are symbols too.
    pub fn add_program_def(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.symbol_defs.insert(name.clone());
        self.program_defs.insert(name);
    }

    pub fn add_symbol_def(&mut self, name: &str) {
        self.symbol_defs.insert(name.to_lowercase());
    }

    /// Record a module use. Used modules are symbol dependencies too.
    pub fn add_module_dep(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.symbol_deps.insert(name.clone());
        self.module_deps.insert(name);
    }

    pub fn add_symbol_dep(&mut self, name: &str) {
        self.symbol_deps.insert(name.to_lowercase());
    }
}

impl Analysed for AnalysedFortran {
    fn fpath(&self) -> &Path {
        &self.fpath
    }

    fn file_hash(&self) -> ContentHash {
        self.file_hash
    }
}

/// What a C source file defines and depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysedC {
    pub fpath: PathBuf,
    pub file_hash: ContentHash,
    pub symbol_defs: BTreeSet<String>,
    pub symbol_deps: BTreeSet<String>,
    pub file_deps: BTreeSet<PathBuf>,
}

impl AnalysedC {
    #[must_use]
    pub fn new(fpath: impl Into<PathBuf>, file_hash: ContentHash) -> Self {
        Self {
            fpath: fpath.into(),
            file_hash,
            ..Self::default()
        }
    }

    pub fn add_symbol_def(&mut self, name: &str) {
        self.symbol_defs.insert(name.to_string());
    }

    pub fn add_symbol_dep(&mut self, name: &str) {
        self.symbol_deps.insert(name.to_string());
    }
}

impl Analysed for AnalysedC {
    fn fpath(&self) -> &Path {
        &self.fpath
    }

    fn file_hash(&self) -> ContentHash {
        self.file_hash
    }
}

/// What an x90 PSyclone algorithm file references: the kernel metadata
/// symbols named in its `invoke` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysedX90 {
    pub fpath: PathBuf,
    pub file_hash: ContentHash,
    pub kernel_deps: BTreeSet<String>,
}

impl AnalysedX90 {
    #[must_use]
    pub fn new(fpath: impl Into<PathBuf>, file_hash: ContentHash) -> Self {
        Self {
            fpath: fpath.into(),
            file_hash,
            kernel_deps: BTreeSet::new(),
        }
    }
}

impl Analysed for AnalysedX90 {
    fn fpath(&self) -> &Path {
        &self.fpath
    }

    fn file_hash(&self) -> ContentHash {
        self.file_hash
    }
}

/// A language-tagged analysis result, as stored in the project artefacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysedUnit {
    Fortran(AnalysedFortran),
    C(AnalysedC),
}

impl AnalysedUnit {
    #[must_use]
    pub fn fpath(&self) -> &Path {
        match self {
            Self::Fortran(a) => &a.fpath,
            Self::C(a) => &a.fpath,
        }
    }

    #[must_use]
    pub fn file_hash(&self) -> ContentHash {
        match self {
            Self::Fortran(a) => a.file_hash,
            Self::C(a) => a.file_hash,
        }
    }

    #[must_use]
    pub fn symbol_defs(&self) -> &BTreeSet<String> {
        match self {
            Self::Fortran(a) => &a.symbol_defs,
            Self::C(a) => &a.symbol_defs,
        }
    }

    #[must_use]
    pub fn symbol_deps(&self) -> &BTreeSet<String> {
        match self {
            Self::Fortran(a) => &a.symbol_deps,
            Self::C(a) => &a.symbol_deps,
        }
    }

    #[must_use]
    pub fn file_deps(&self) -> &BTreeSet<PathBuf> {
        match self {
            Self::Fortran(a) => &a.file_deps,
            Self::C(a) => &a.file_deps,
        }
    }

    pub fn file_deps_mut(&mut self) -> &mut BTreeSet<PathBuf> {
        match self {
            Self::Fortran(a) => &mut a.file_deps,
            Self::C(a) => &mut a.file_deps,
        }
    }

    #[must_use]
    pub fn as_fortran(&self) -> Option<&AnalysedFortran> {
        match self {
            Self::Fortran(a) => Some(a),
            Self::C(_) => None,
        }
    }
}

/// The outcome of analysing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis<T> {
    /// The file carries compilable content.
    Analysed {
        analysis: T,
        /// Where the analysis record was persisted.
        record: PathBuf,
    },
    /// Nothing but comments; the file takes no further part in the build.
    EmptySource,
}

/// The record file name for `fpath` analysed at `hash`:
/// `<prebuild_dir>/<stem>.<hash>.an`.
#[must_use]
pub fn record_path(prebuild_dir: &Path, fpath: &Path, hash: ContentHash) -> PathBuf {
    let stem = fpath
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    prebuild_dir.join(format!("{stem}.{hash}.an"))
}

/// Persist an analysis record. The parent directory must already exist.
pub fn save_record<T: Serialize>(path: &Path, analysis: &T) -> Result<(), String> {
    let bytes = bincode::serialize(analysis).map_err(|e| e.to_string())?;
    fs::write(path, bytes).map_err(|e| e.to_string())
}

/// Load a previously saved record.
///
/// Returns `None` when the record is missing or unreadable; the caller falls
/// back to a fresh parse, so a corrupt record costs time but never
/// correctness.
#[must_use]
pub fn load_record<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let bytes = fs::read(path).ok()?;
    bincode::deserialize(&bytes).ok()
}

#[cfg(test)]
mod tests;
