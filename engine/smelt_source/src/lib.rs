//! Source analysis for the Smelt build engine.
//!
//! Grammar parsing is an external collaborator: a [`SourceParser`] hands the
//! analysers a [`ParseTree`] with parent-link navigation, and the analysers
//! walk it once to extract the facts dependency resolution needs — which
//! global symbols a file defines, which it references, and which legacy
//! `DEPENDS ON:` comments it carries. The extracted facts are persisted per
//! file, keyed by content hash, so unchanged files are never re-parsed.
//!
//! ```text
//! source file ──parse──► ParseTree ──walk──► AnalysedFortran / AnalysedC
//!                                              │
//!                                              ▼
//!                                   <stem>.<file_hash>.an  (bincode record)
//! ```

pub mod analysed;
pub mod c;
pub mod fortran;
pub mod parser;
pub mod tree;
pub mod x90;

pub use analysed::{
    load_record, record_path, save_record, Analysed, AnalysedC, AnalysedFortran, AnalysedUnit,
    AnalysedX90, Analysis,
};
pub use c::CAnalyser;
pub use fortran::FortranAnalyser;
pub use parser::{ParseError, SourceParser};
pub use tree::{NodeId, NodeKind, ParseTree};
pub use x90::X90Analyser;

use std::path::PathBuf;

use smelt_hash::HashError;

/// Error while analysing one source file.
///
/// A failure here is scoped to the file: the batch layer records it and
/// carries on with the rest of the sources.
#[derive(Debug)]
pub enum AnalysisError {
    /// The external parser rejected the file.
    Parse(ParseError),
    /// The file could not be hashed.
    Hash(HashError),
    /// An analysis record could not be written.
    Record { path: PathBuf, message: String },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Hash(err) => write!(f, "{err}"),
            Self::Record { path, message } => {
                write!(
                    f,
                    "failed to persist analysis record '{}': {}",
                    path.display(),
                    message
                )
            }
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Hash(err) => Some(err),
            Self::Record { .. } => None,
        }
    }
}

impl From<ParseError> for AnalysisError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<HashError> for AnalysisError {
    fn from(err: HashError) -> Self {
        Self::Hash(err)
    }
}
