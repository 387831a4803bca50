//! C compilation. Single pass: C has no compile-order coupling between
//! translation units, so every file can go to the workers at once.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use smelt_hash::{combine_hashes, ContentHash};
use smelt_source::{AnalysedC, AnalysedUnit};
use smelt_tools::Compiler;

use crate::config::{with_jobs, BuildConfig};
use crate::error::BuildError;
use crate::prebuild::{get_or_create, prebuild_path, CompiledFile};
use crate::steps::CompileArgs;

pub fn compile_c(config: &mut BuildConfig, args: &CompileArgs) -> Result<(), BuildError> {
    let compiler = config.toolbox.c_compiler()?;
    let profile = config.profile_name().to_string();
    let compiler_hash = compiler.combo_hash(&profile)?;
    let prebuild_dir = config.prebuild_folder();
    let build_output = config.build_output();

    let mut sources: FxHashMap<PathBuf, AnalysedC> = FxHashMap::default();
    for tree in config.artefacts.build_trees.values() {
        for unit in tree.values() {
            if let AnalysedUnit::C(analysed) = unit {
                sources
                    .entry(analysed.fpath.clone())
                    .or_insert_with(|| analysed.clone());
            }
        }
    }
    if sources.is_empty() {
        return Ok(());
    }
    info!(files = sources.len(), "compiling c");

    let source_list: Vec<&AnalysedC> = sources.values().collect();
    let results: Vec<Result<CompiledFile, BuildError>> = with_jobs(config.jobs, || {
        source_list
            .par_iter()
            .map(|analysed| {
                process_file(
                    &compiler,
                    compiler_hash,
                    &profile,
                    args,
                    &prebuild_dir,
                    &build_output,
                    config.openmp,
                    analysed,
                )
            })
            .collect()
    });

    let mut compiled: FxHashMap<PathBuf, CompiledFile> = FxHashMap::default();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(compiled_file) => {
                config
                    .artefacts
                    .current_prebuilds
                    .insert(compiled_file.output_fpath.clone());
                compiled.insert(compiled_file.input_fpath.clone(), compiled_file);
            }
            Err(err) => errors.push(err),
        }
    }
    BuildError::from_batch("c compile", errors)?;

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

/// Combo-hash and compile one C file, unless its object is already stored.
#[allow(clippy::too_many_arguments)]
fn process_file(
    compiler: &Arc<Compiler>,
    compiler_hash: ContentHash,
    profile: &str,
    args: &CompileArgs,
    prebuild_dir: &PathBuf,
    build_output: &PathBuf,
    openmp: bool,
    analysed: &AnalysedC,
) -> Result<CompiledFile, BuildError> {
    let flags = args
        .flags
        .flags_for_path(&analysed.fpath, &args.source_root, build_output);
    let combo_hash = combine_hashes(&[analysed.file_hash, flags.checksum(), compiler_hash]);

    let stem = analysed
        .fpath
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let object = prebuild_path(prebuild_dir, &stem, combo_hash, "o");

    let hit = get_or_create(&object, || {
        compiler
            .compile_file(&analysed.fpath, &object, &flags, openmp, profile)
            .map_err(|source| BuildError::Compile {
                fpath: analysed.fpath.clone(),
                source,
            })
    })?;
    if hit {
        debug!(fpath = %analysed.fpath.display(), "prebuild hit");
    }

    Ok(CompiledFile {
        input_fpath: analysed.fpath.clone(),
        output_fpath: object,
    })
}
