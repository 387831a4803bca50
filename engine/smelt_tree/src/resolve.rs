//! Turns symbol-level dependencies into file-level dependencies.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use tracing::warn;

use smelt_source::AnalysedUnit;

use crate::symbols::SymbolTable;

/// Symbols nothing in the batch defines.
///
/// Not an error: external library symbols land here legitimately. The caller
/// decides whether the remainder is worth reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnresolvedSymbols {
    pub symbols: BTreeSet<String>,
}

impl UnresolvedSymbols {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Fill every unit's `file_deps` from its `symbol_deps`.
///
/// A dependency on a symbol the file itself defines is not a file
/// dependency. Names on the ignore list are dropped silently; anything else
/// that fails to resolve is aggregated and logged, never fatal.
pub fn resolve_file_deps(
    units: &mut [AnalysedUnit],
    table: &SymbolTable,
    ignore: &FxHashSet<String>,
) -> UnresolvedSymbols {
    let mut unresolved = UnresolvedSymbols::default();

    for unit in units.iter_mut() {
        let own_path = unit.fpath().to_path_buf();
        let deps: Vec<String> = unit.symbol_deps().iter().cloned().collect();
        for symbol in deps {
            if ignore.contains(&symbol) {
                continue;
            }
            match table.get(&symbol) {
                Some(dep_path) if *dep_path == own_path => {}
                Some(dep_path) => {
                    unit.file_deps_mut().insert(dep_path.clone());
                }
                None => {
                    unresolved.symbols.insert(symbol);
                }
            }
        }
    }

    for symbol in &unresolved.symbols {
        warn!(symbol, "no file defines this referenced symbol");
    }
    unresolved
}
