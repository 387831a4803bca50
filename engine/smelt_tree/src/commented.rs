//! Resolution of legacy `DEPENDS ON:` file-level dependencies.
//!
//! These bypass the symbol table entirely: a Fortran file names a C object
//! (`util.o`) and the dependency is matched against analysed C files by
//! filename, with the `.o` suffix translated back to `.c`.

use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use smelt_source::AnalysedUnit;

/// Merge commented object dependencies into `file_deps`.
///
/// Names on the ignore list are skipped in either spelling (`util.o` or
/// `util.c`). Names that resolve to nothing are logged and dropped; builds of
/// codebases that carry these comments for other build systems must not fail
/// on them.
pub fn add_commented_file_deps(units: &mut [AnalysedUnit], ignore: &FxHashSet<String>) {
    let c_files_by_name: FxHashMap<String, PathBuf> = units
        .iter()
        .filter_map(|unit| match unit {
            AnalysedUnit::C(c) => c
                .fpath
                .file_name()
                .map(|name| (name.to_string_lossy().into_owned(), c.fpath.clone())),
            AnalysedUnit::Fortran(_) => None,
        })
        .collect();

    for unit in units.iter_mut() {
        let AnalysedUnit::Fortran(fortran) = unit else {
            continue;
        };
        let commented: Vec<String> = fortran.mo_commented_file_deps.iter().cloned().collect();
        for object_name in commented {
            if ignore.contains(&object_name) {
                continue;
            }
            let source_name = format!(
                "{}.c",
                object_name.strip_suffix(".o").unwrap_or(&object_name)
            );
            if ignore.contains(&source_name) {
                continue;
            }
            match c_files_by_name.get(&source_name) {
                Some(c_path) => {
                    fortran.file_deps.insert(c_path.clone());
                }
                None => warn!(
                    fpath = %fortran.fpath.display(),
                    object_name,
                    "commented dependency matches no analysed C file"
                ),
            }
        }
    }
}
