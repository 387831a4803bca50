//! The global symbol table: who defines what.

use std::collections::hash_map::Entry;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use smelt_source::AnalysedUnit;

use crate::TreeError;

/// Symbol name to the file that defines it.
pub type SymbolTable = FxHashMap<String, PathBuf>;

/// Aggregate all analysed files into one symbol table.
///
/// Symbols are globally unique: a second definition is a fatal error, since
/// dependency resolution would otherwise silently pick one of the two.
pub fn build_symbol_table(units: &[AnalysedUnit]) -> Result<SymbolTable, TreeError> {
    let mut table = SymbolTable::default();
    for unit in units {
        for symbol in unit.symbol_defs() {
            match table.entry(symbol.clone()) {
                Entry::Occupied(existing) => {
                    return Err(TreeError::DuplicateSymbol {
                        symbol: symbol.clone(),
                        first: existing.get().clone(),
                        second: unit.fpath().to_path_buf(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(unit.fpath().to_path_buf());
                }
            }
        }
    }
    Ok(table)
}
