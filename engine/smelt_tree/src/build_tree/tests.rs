use pretty_assertions::assert_eq;

use smelt_hash::ContentHash;
use smelt_source::{AnalysedFortran, AnalysedUnit};

use crate::resolve::resolve_file_deps;
use crate::symbols::build_symbol_table;

use super::*;

fn unit(fpath: &str, defs: &[&str], deps: &[&str]) -> AnalysedUnit {
    let mut a = AnalysedFortran::new(fpath, ContentHash::new(1));
    for def in defs {
        a.add_symbol_def(def);
    }
    for dep in deps {
        a.add_symbol_dep(dep);
    }
    AnalysedUnit::Fortran(a)
}

/// main → util → base, plus an orphan no one references.
fn resolved_units() -> (SymbolTable, FxHashMap<PathBuf, AnalysedUnit>) {
    let mut units = vec![
        unit("/src/main.f90", &["main"], &["util_mod"]),
        unit("/src/util.f90", &["util_mod"], &["base_mod"]),
        unit("/src/base.f90", &["base_mod"], &[]),
        unit("/src/orphan.f90", &["orphan_mod"], &["base_mod"]),
    ];
    let table = build_symbol_table(&units).unwrap();
    resolve_file_deps(&mut units, &table, &Default::default());
    let by_path = units
        .into_iter()
        .map(|u| (u.fpath().to_path_buf(), u))
        .collect();
    (table, by_path)
}

#[test]
fn tree_contains_the_transitive_closure() {
    let (table, by_path) = resolved_units();
    let tree = extract_build_tree("main", &table, &by_path).unwrap();

    let mut paths: Vec<_> = tree.keys().cloned().collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/src/base.f90"),
            PathBuf::from("/src/main.f90"),
            PathBuf::from("/src/util.f90"),
        ]
    );

    // Closure invariant: every dependency of a member is a member.
    for unit in tree.values() {
        for dep in unit.file_deps() {
            assert!(tree.contains_key(dep), "dep {} missing", dep.display());
        }
    }
}

#[test]
fn unrelated_files_stay_out() {
    let (table, by_path) = resolved_units();
    let tree = extract_build_tree("main", &table, &by_path).unwrap();
    assert!(!tree.contains_key(&PathBuf::from("/src/orphan.f90")));
}

#[test]
fn missing_root_symbol_is_fatal() {
    let (table, by_path) = resolved_units();
    let err = extract_build_tree("no_such_program", &table, &by_path).unwrap_err();
    assert!(matches!(
        err,
        TreeError::MissingRootSymbol { symbol } if symbol == "no_such_program"
    ));
}

#[test]
fn unreferenced_deps_seed_extra_subtrees() {
    let (table, by_path) = resolved_units();
    let mut tree = extract_build_tree("main", &table, &by_path).unwrap();

    add_unreferenced_deps(
        &["orphan_mod".to_string()],
        &table,
        &by_path,
        &mut tree,
    );
    assert!(tree.contains_key(&PathBuf::from("/src/orphan.f90")));
    assert_eq!(tree.len(), 4);

    // An unknown symbol is logged, not fatal.
    add_unreferenced_deps(&["ghost".to_string()], &table, &by_path, &mut tree);
    assert_eq!(tree.len(), 4);
}
