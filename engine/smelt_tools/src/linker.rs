//! Linkers, built on top of a compiler driver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::compiler::Compiler;
use crate::flags::Flags;
use crate::ToolError;

/// A linker driving its compiler's executable, with a per-library flag
/// table so build scripts can say "netcdf" instead of spelling out `-l`
/// incantations per machine.
#[derive(Debug)]
pub struct Linker {
    name: String,
    compiler: Arc<Compiler>,
    lib_flags: FxHashMap<String, Vec<String>>,
    pre_lib_flags: Vec<String>,
    post_lib_flags: Vec<String>,
}

impl Linker {
    #[must_use]
    pub fn new(compiler: Arc<Compiler>) -> Self {
        Self {
            name: format!("linker-{}", compiler.name()),
            compiler,
            lib_flags: FxHashMap::default(),
            pre_lib_flags: Vec::new(),
            post_lib_flags: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn compiler(&self) -> &Arc<Compiler> {
        &self.compiler
    }

    /// Teach the linker how to link a named library on this machine.
    pub fn add_lib_flags<S: Into<String>>(
        &mut self,
        library: &str,
        flags: impl IntoIterator<Item = S>,
    ) {
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        if self.lib_flags.insert(library.to_string(), flags).is_some() {
            warn!(library, linker = %self.name, "replacing library flags");
        }
    }

    pub fn add_pre_lib_flags<S: Into<String>>(&mut self, flags: impl IntoIterator<Item = S>) {
        self.pre_lib_flags.extend(flags.into_iter().map(Into::into));
    }

    pub fn add_post_lib_flags<S: Into<String>>(&mut self, flags: impl IntoIterator<Item = S>) {
        self.post_lib_flags
            .extend(flags.into_iter().map(Into::into));
    }

    fn flags_for_library(&self, library: &str) -> Result<&[String], ToolError> {
        self.lib_flags
            .get(library)
            .map(Vec::as_slice)
            .ok_or_else(|| ToolError::UnknownLibrary {
                library: library.to_string(),
                linker: self.name.clone(),
            })
    }

    /// Link objects into `out`. Objects are sorted so the command line, and
    /// with it any linker map output, is reproducible run to run.
    pub fn link(
        &self,
        objects: &[PathBuf],
        out: &Path,
        libs: &[String],
        add_flags: &Flags,
        openmp: bool,
        profile: &str,
    ) -> Result<PathBuf, ToolError> {
        let mut sorted: Vec<&PathBuf> = objects.iter().collect();
        sorted.sort();

        let mut args: Vec<String> = Vec::new();
        if openmp {
            if let Some(flag) = self.compiler.openmp_flag() {
                args.push(flag.to_string());
            }
        }
        args.extend(sorted.iter().map(|o| o.to_string_lossy().into_owned()));
        args.extend(add_flags.as_slice().iter().cloned());
        args.extend(self.pre_lib_flags.iter().cloned());
        for lib in libs {
            args.extend(self.flags_for_library(lib)?.iter().cloned());
        }
        args.extend(self.post_lib_flags.iter().cloned());
        args.push("-o".to_string());
        args.push(out.to_string_lossy().into_owned());

        self.compiler.tool().run(&args, profile, None)?;
        Ok(out.to_path_buf())
    }
}
