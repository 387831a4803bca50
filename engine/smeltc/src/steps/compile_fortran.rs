//! Multi-pass Fortran compilation against the prebuild cache.
//!
//! Fortran imposes a real compile order: a file cannot compile until the
//! `.mod` interfaces of every module it uses exist, and its object's
//! combo-hash includes those modules' hashes. Each pass therefore compiles
//! exactly the files whose dependencies finished in earlier passes, in
//! parallel within the pass, until nothing is left or nothing can proceed.
//!
//! The flags config is expected to direct module output into the build
//! output directory (e.g. gfortran's `-J`); the prebuild stash and restore
//! of `.mod` files works relative to that directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use smelt_hash::{combine_hashes, ContentHash};
use smelt_source::{AnalysedFortran, AnalysedUnit};
use smelt_tools::Compiler;

use crate::config::{with_jobs, BuildConfig};
use crate::error::{BuildError, StuckFile};
use crate::prebuild::{prebuild_path, CompiledFile};
use crate::steps::CompileArgs;

pub fn compile_fortran(config: &mut BuildConfig, args: &CompileArgs) -> Result<(), BuildError> {
    let compiler = config.toolbox.fortran_compiler()?;
    let profile = config.profile_name().to_string();
    let context = CompileContext {
        compiler_hash: compiler.combo_hash(&profile)?,
        compiler,
        profile,
        flags: args.flags.clone(),
        source_root: args.source_root.clone(),
        prebuild_dir: config.prebuild_folder(),
        build_output: config.build_output(),
        openmp: config.openmp,
    };

    // The union of every tree's Fortran members; shared files compile once.
    let mut uncompiled: FxHashMap<PathBuf, AnalysedFortran> = FxHashMap::default();
    for tree in config.artefacts.build_trees.values() {
        for unit in tree.values() {
            if let AnalysedUnit::Fortran(analysed) = unit {
                uncompiled
                    .entry(analysed.fpath.clone())
                    .or_insert_with(|| analysed.clone());
            }
        }
    }
    info!(files = uncompiled.len(), "compiling fortran");

    let mut compiled: FxHashMap<PathBuf, CompiledFile> = FxHashMap::default();
    let mut mod_hashes: FxHashMap<String, ContentHash> = FxHashMap::default();
    let mut passes = 0usize;

    while !uncompiled.is_empty() {
        let ready = get_compile_next(&compiled, &uncompiled)?;
        passes += 1;
        debug!(pass = passes, ready = ready.len(), "compile pass");

        let results: Vec<Result<ProcessOutcome, BuildError>> = with_jobs(config.jobs, || {
            ready
                .par_iter()
                .map(|analysed| process_file(&context, analysed, &mod_hashes))
                .collect()
        });

        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(outcome) => {
                    uncompiled.remove(&outcome.compiled.input_fpath);
                    config
                        .artefacts
                        .add_current_prebuilds(outcome.prebuild_artefacts);
                    // The single-threaded merge point for module hashes:
                    // workers never touch the table directly.
                    mod_hashes.extend(outcome.module_hashes);
                    compiled.insert(outcome.compiled.input_fpath.clone(), outcome.compiled);
                }
                Err(err) => errors.push(err),
            }
        }
        BuildError::from_batch("fortran compile pass", errors)?;
    }
    info!(files = compiled.len(), passes, "fortran compilation complete");

    let mut per_target: Vec<(Option<String>, PathBuf)> = Vec::new();
    for (key, tree) in &config.artefacts.build_trees {
        for fpath in tree.keys() {
            if let Some(compiled_file) = compiled.get(fpath) {
                per_target.push((key.clone(), compiled_file.output_fpath.clone()));
            }
        }
    }
    for (key, object) in per_target {
        config.artefacts.add_object_file(&key, object);
    }
    Ok(())
}

struct CompileContext {
    compiler: Arc<Compiler>,
    compiler_hash: ContentHash,
    profile: String,
    flags: crate::config::FlagsConfig,
    source_root: PathBuf,
    prebuild_dir: PathBuf,
    build_output: PathBuf,
    openmp: bool,
}

struct ProcessOutcome {
    compiled: CompiledFile,
    module_hashes: Vec<(String, ContentHash)>,
    prebuild_artefacts: Vec<PathBuf>,
}

/// The files whose dependencies are all satisfied.
///
/// Only uncompiled Fortran dependencies block a file: C objects have no
/// compile-order relationship with Fortran sources, and their dependencies
/// arrive through the commented-deps merge.
fn get_compile_next(
    compiled: &FxHashMap<PathBuf, CompiledFile>,
    uncompiled: &FxHashMap<PathBuf, AnalysedFortran>,
) -> Result<Vec<AnalysedFortran>, BuildError> {
    let blocking = |dep: &PathBuf| is_fortran(dep) && !compiled.contains_key(dep);

    let ready: Vec<AnalysedFortran> = uncompiled
        .values()
        .filter(|analysed| !analysed.file_deps.iter().any(blocking))
        .cloned()
        .collect();

    if ready.is_empty() && !uncompiled.is_empty() {
        let mut stuck: Vec<StuckFile> = uncompiled
            .values()
            .map(|analysed| StuckFile {
                fpath: analysed.fpath.clone(),
                waiting_on: analysed.file_deps.iter().filter(|d| blocking(d)).cloned().collect(),
            })
            .collect();
        stuck.sort_by(|a, b| a.fpath.cmp(&b.fpath));
        return Err(BuildError::Deadlock { stuck });
    }
    Ok(ready)
}

fn is_fortran(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("f90" | "F90" | "f" | "F")
    )
}

/// Compile one file, or reuse its prebuilt artefacts.
///
/// The object's combo-hash covers the source content, the resolved flags,
/// the compiler identity and every used module's interface hash, so a change
/// anywhere upstream recompiles this file. A module interface's own hash
/// covers only source and compiler: flags do not change a module's
/// interface.
fn process_file(
    context: &CompileContext,
    analysed: &AnalysedFortran,
    mod_hashes: &FxHashMap<String, ContentHash>,
) -> Result<ProcessOutcome, BuildError> {
    let flags = context
        .flags
        .flags_for_path(&analysed.fpath, &context.source_root, &context.build_output);

    let mut hash_parts = vec![analysed.file_hash, flags.checksum(), context.compiler_hash];
    // module_deps is ordered by name, keeping the combination deterministic.
    for module in &analysed.module_deps {
        if let Some(hash) = mod_hashes.get(module) {
            hash_parts.push(*hash);
        }
    }
    let combo_hash = combine_hashes(&hash_parts);

    let stem = analysed
        .fpath
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let object = prebuild_path(&context.prebuild_dir, &stem, combo_hash, "o");

    let module_hashes: Vec<(String, ContentHash)> = analysed
        .module_defs
        .iter()
        .map(|module| {
            (
                module.clone(),
                combine_hashes(&[analysed.file_hash, context.compiler_hash]),
            )
        })
        .collect();
    let prebuild_mods: Vec<(String, PathBuf)> = module_hashes
        .iter()
        .map(|(module, hash)| {
            (
                module.clone(),
                prebuild_path(&context.prebuild_dir, module, *hash, "mod"),
            )
        })
        .collect();

    // A hit needs the object AND every module interface; a cleanup that
    // removed one interface forces a recompile.
    let hit = object.exists() && prebuild_mods.iter().all(|(_, path)| path.exists());

    if hit {
        debug!(fpath = %analysed.fpath.display(), "prebuild hit");
        for (module, stashed) in &prebuild_mods {
            let live = context.build_output.join(format!("{module}.mod"));
            copy_file(stashed, &live)?;
        }
    } else {
        context
            .compiler
            .compile_file(&analysed.fpath, &object, &flags, context.openmp, &context.profile)
            .map_err(|source| BuildError::Compile {
                fpath: analysed.fpath.clone(),
                source,
            })?;
        for (module, stashed) in &prebuild_mods {
            let live = context.build_output.join(format!("{module}.mod"));
            copy_file(&live, stashed)?;
        }
    }

    let mut prebuild_artefacts = vec![object.clone()];
    prebuild_artefacts.extend(prebuild_mods.into_iter().map(|(_, path)| path));

    Ok(ProcessOutcome {
        compiled: CompiledFile {
            input_fpath: analysed.fpath.clone(),
            output_fpath: object,
        },
        module_hashes,
        prebuild_artefacts,
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    fs::copy(from, to).map_err(|e| BuildError::Io {
        path: from.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}
