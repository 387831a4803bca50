//! The analyse step: sources in, build trees out.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info, warn};

use smelt_hash::file_checksum;
use smelt_source::{
    record_path, save_record, Analysis, AnalysedFortran, AnalysedUnit, CAnalyser,
    FortranAnalyser, SourceParser,
};
use smelt_tree::{
    add_commented_file_deps, add_unreferenced_deps, build_symbol_table, extract_build_tree,
    resolve_file_deps, BuildTree,
};

use crate::config::{with_jobs, BuildConfig};
use crate::error::BuildError;

pub struct AnalyseArgs {
    pub fortran_parser: Arc<dyn SourceParser>,
    pub c_parser: Arc<dyn SourceParser>,
    pub fortran_sources: Vec<PathBuf>,
    pub c_sources: Vec<PathBuf>,
    /// Build one tree per named root symbol. Empty means one tree per
    /// discovered program, unless `library_mode` is set.
    pub root_symbols: Vec<String>,
    /// Build a single unnamed tree containing everything.
    pub library_mode: bool,
    /// Symbols forced into every tree regardless of reachability.
    pub unreferenced_deps: Vec<String>,
    /// Symbols and commented-dependency names to never resolve.
    pub ignore_dependencies: Vec<String>,
    /// Hand-written analysis results for files the parser cannot handle.
    /// They are hashed and enter the symbol table exactly like parsed files.
    pub workarounds: Vec<AnalysedFortran>,
}

/// Analyse all sources and store one build tree per target in the artefact
/// store.
///
/// A parse failure is scoped to its file: the batch continues and the
/// failures are reported in aggregate at the end.
pub fn analyse(config: &mut BuildConfig, args: AnalyseArgs) -> Result<(), BuildError> {
    let prebuild_dir = config.prebuild_folder();
    let total = args.fortran_sources.len() + args.c_sources.len();

    let mut fortran_analyser = FortranAnalyser::new(args.fortran_parser.clone(), config.openmp);
    let mut c_analyser = CAnalyser::new(args.c_parser.clone());
    for name in &args.ignore_dependencies {
        fortran_analyser.ignore_dependency(name);
        c_analyser.ignore_dependency(name);
    }

    let fortran_results = with_jobs(config.jobs, || {
        args.fortran_sources
            .par_iter()
            .map(|fpath| (fpath.clone(), fortran_analyser.run(fpath, &prebuild_dir)))
            .collect::<Vec<_>>()
    });
    let c_results = with_jobs(config.jobs, || {
        args.c_sources
            .par_iter()
            .map(|fpath| (fpath.clone(), c_analyser.run(fpath, &prebuild_dir)))
            .collect::<Vec<_>>()
    });

    let mut units: Vec<AnalysedUnit> = Vec::new();
    let mut failed = 0usize;

    for (fpath, result) in fortran_results {
        match result {
            Ok(Analysis::Analysed { analysis, record }) => {
                config.artefacts.current_prebuilds.insert(record);
                units.push(AnalysedUnit::Fortran(analysis));
            }
            Ok(Analysis::EmptySource) => {
                debug!(fpath = %fpath.display(), "skipping empty source");
            }
            Err(err) => match workaround_for(&args.workarounds, &fpath) {
                Some(workaround) => {
                    warn!(fpath = %fpath.display(), "analysis failed, using manual workaround");
                    let record = persist_workaround(&prebuild_dir, workaround)?;
                    config.artefacts.current_prebuilds.insert(record.1);
                    units.push(AnalysedUnit::Fortran(record.0));
                }
                None => {
                    error!(fpath = %fpath.display(), %err, "analysis failed");
                    failed += 1;
                }
            },
        }
    }
    for (fpath, result) in c_results {
        match result {
            Ok(Analysis::Analysed { analysis, record }) => {
                config.artefacts.current_prebuilds.insert(record);
                units.push(AnalysedUnit::C(analysis));
            }
            Ok(Analysis::EmptySource) => {
                debug!(fpath = %fpath.display(), "skipping empty source");
            }
            Err(err) => {
                error!(fpath = %fpath.display(), %err, "analysis failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(BuildError::AnalysisFailures { failed, total });
    }

    let table = build_symbol_table(&units).map_err(BuildError::Tree)?;

    let ignore: FxHashSet<String> = args.ignore_dependencies.iter().cloned().collect();
    let unresolved = resolve_file_deps(&mut units, &table, &ignore);
    if !unresolved.is_empty() {
        warn!(count = unresolved.symbols.len(), "unresolved symbols remain; assuming external");
    }
    add_commented_file_deps(&mut units, &ignore);

    let units_by_path: FxHashMap<PathBuf, AnalysedUnit> = units
        .iter()
        .map(|u| (u.fpath().to_path_buf(), u.clone()))
        .collect();

    let mut trees: Vec<(Option<String>, BuildTree)> = if args.library_mode {
        vec![(None, units_by_path.clone())]
    } else if !args.root_symbols.is_empty() {
        let mut trees = Vec::new();
        for root in &args.root_symbols {
            trees.push((
                Some(root.clone()),
                extract_build_tree(root, &table, &units_by_path)?,
            ));
        }
        trees
    } else {
        // No roots requested: every discovered program becomes a target.
        let mut trees = Vec::new();
        for unit in &units {
            let Some(fortran) = unit.as_fortran() else {
                continue;
            };
            for program in &fortran.program_defs {
                trees.push((
                    Some(program.clone()),
                    extract_build_tree(program, &table, &units_by_path)?,
                ));
            }
        }
        trees
    };

    for (key, tree) in &mut trees {
        add_unreferenced_deps(&args.unreferenced_deps, &table, &units_by_path, tree);
        info!(
            target = key.as_deref().unwrap_or("<library>"),
            files = tree.len(),
            "extracted build tree"
        );
    }

    config.artefacts.build_trees = trees.into_iter().collect();
    Ok(())
}

fn workaround_for<'a>(
    workarounds: &'a [AnalysedFortran],
    fpath: &PathBuf,
) -> Option<&'a AnalysedFortran> {
    workarounds.iter().find(|w| &w.fpath == fpath)
}

/// Hash and persist a manual analysis result so it behaves exactly like a
/// parsed one, current-prebuild tracking included.
fn persist_workaround(
    prebuild_dir: &std::path::Path,
    workaround: &AnalysedFortran,
) -> Result<(AnalysedFortran, PathBuf), BuildError> {
    let mut analysis = workaround.clone();
    analysis.file_hash = file_checksum(&analysis.fpath).map_err(|e| BuildError::Io {
        path: analysis.fpath.clone(),
        message: e.to_string(),
    })?;
    let record = record_path(prebuild_dir, &analysis.fpath, analysis.file_hash);
    save_record(&record, &analysis).map_err(|message| BuildError::Io {
        path: record.clone(),
        message,
    })?;
    Ok((analysis, record))
}

#[cfg(test)]
mod tests;
