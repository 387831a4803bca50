//! Transitive-closure extraction: from root symbols to compilable trees.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use smelt_source::AnalysedUnit;

use crate::symbols::SymbolTable;
use crate::TreeError;

/// Every file reachable from a tree's roots, keyed by path.
///
/// Closure holds by construction: each member's `file_deps` are members too,
/// which is what lets the scheduler treat membership as "will be compiled".
pub type BuildTree = FxHashMap<PathBuf, AnalysedUnit>;

/// Extract the build tree rooted at `root_symbol`.
///
/// Depth-first over `file_deps`, starting from the file defining the root.
pub fn extract_build_tree(
    root_symbol: &str,
    table: &SymbolTable,
    units_by_path: &FxHashMap<PathBuf, AnalysedUnit>,
) -> Result<BuildTree, TreeError> {
    let root_file = table
        .get(root_symbol)
        .ok_or_else(|| TreeError::MissingRootSymbol {
            symbol: root_symbol.to_string(),
        })?;

    let mut tree = BuildTree::default();
    add_subtree(root_file, units_by_path, &mut tree);
    debug!(root = root_symbol, files = tree.len(), "extracted build tree");
    Ok(tree)
}

/// Force extra symbols and their transitive dependencies into `tree`,
/// whether or not anything in the tree references them. Needed for code
/// reached only through mechanisms the analyser cannot see.
pub fn add_unreferenced_deps(
    symbols: &[String],
    table: &SymbolTable,
    units_by_path: &FxHashMap<PathBuf, AnalysedUnit>,
    tree: &mut BuildTree,
) {
    for symbol in symbols {
        match table.get(symbol) {
            Some(fpath) => add_subtree(fpath, units_by_path, tree),
            None => warn!(symbol, "unreferenced dependency symbol not defined anywhere"),
        }
    }
}

fn add_subtree(
    root: &PathBuf,
    units_by_path: &FxHashMap<PathBuf, AnalysedUnit>,
    tree: &mut BuildTree,
) {
    let mut stack = vec![root.clone()];
    while let Some(fpath) = stack.pop() {
        if tree.contains_key(&fpath) {
            continue;
        }
        let Some(unit) = units_by_path.get(&fpath) else {
            // Resolution only ever points at analysed files, so this means
            // the caller passed an incomplete unit set.
            warn!(fpath = %fpath.display(), "dependency missing from the analysed set");
            continue;
        };
        stack.extend(unit.file_deps().iter().cloned());
        tree.insert(fpath, unit.clone());
    }
}

#[cfg(test)]
mod tests;
