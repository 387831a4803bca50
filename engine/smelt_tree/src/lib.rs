//! Turns a batch of analysed files into compilable build trees.
//!
//! Analysis produces per-file facts; this crate aggregates them. A global
//! symbol table maps every defined symbol to its owning file, symbol-level
//! dependencies are resolved into file-level dependencies, and the transitive
//! closure reachable from each requested root becomes a build tree the
//! scheduler can walk.

use std::path::PathBuf;

pub mod build_tree;
pub mod commented;
pub mod resolve;
pub mod symbols;

pub use build_tree::{add_unreferenced_deps, extract_build_tree, BuildTree};
pub use commented::add_commented_file_deps;
pub use resolve::{resolve_file_deps, UnresolvedSymbols};
pub use symbols::{build_symbol_table, SymbolTable};

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Two files define the same global symbol. Both paths are named so the
    /// clash can be located without a second run.
    #[error(
        "symbol '{symbol}' is defined in both '{}' and '{}'",
        first.display(),
        second.display()
    )]
    DuplicateSymbol {
        symbol: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A build tree was requested for a symbol no analysed file defines.
    #[error("no analysed file defines the requested root symbol '{symbol}'")]
    MissingRootSymbol { symbol: String },
}
