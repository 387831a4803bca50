//! The seam between the build engine and the external grammar parsers.

use std::path::{Path, PathBuf};

use crate::tree::ParseTree;

/// Turns a source file into a [`ParseTree`].
///
/// Implementations wrap the actual grammar front ends. They must be shareable
/// across the analysis worker pool.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParseTree, ParseError>;
}

/// A syntax error from the external parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub fpath: PathBuf,
    /// 1-based line, when the parser reports one.
    pub line: Option<u32>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} ({}:{})", self.message, self.fpath.display(), line),
            None => write!(f, "{} ({})", self.message, self.fpath.display()),
        }
    }
}

impl std::error::Error for ParseError {}
