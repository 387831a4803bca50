//! Extracts definitions and dependencies from parsed C.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use smelt_hash::file_checksum;

use crate::analysed::{record_path, save_record, Analysis, AnalysedC};
use crate::parser::SourceParser;
use crate::tree::NodeKind;
use crate::AnalysisError;

/// Walks a C parse tree and records external symbol definitions and the
/// calls made to symbols defined elsewhere.
pub struct CAnalyser {
    parser: Arc<dyn SourceParser>,
    ignore_dependencies: FxHashSet<String>,
}

impl CAnalyser {
    #[must_use]
    pub fn new(parser: Arc<dyn SourceParser>) -> Self {
        Self {
            parser,
            ignore_dependencies: FxHashSet::default(),
        }
    }

    pub fn ignore_dependency(&mut self, name: &str) {
        self.ignore_dependencies.insert(name.to_string());
    }

    pub fn run(
        &self,
        fpath: &Path,
        prebuild_dir: &Path,
    ) -> Result<Analysis<AnalysedC>, AnalysisError> {
        let file_hash = file_checksum(fpath)?;
        let record = record_path(prebuild_dir, fpath, file_hash);

        if let Some(previous) = crate::analysed::load_record::<AnalysedC>(&record) {
            debug!(fpath = %fpath.display(), "reusing analysis record");
            return Ok(Analysis::Analysed {
                analysis: previous,
                record,
            });
        }

        let tree = self.parser.parse(fpath)?;
        if tree.is_empty_source() {
            return Ok(Analysis::EmptySource);
        }

        let mut analysis = AnalysedC::new(fpath, file_hash);
        for node in tree.nodes() {
            match tree.kind(node) {
                // Only file-scope functions have external linkage.
                NodeKind::Function { name } => {
                    if tree
                        .find_ancestor(node, |k| matches!(k, NodeKind::Function { .. }))
                        .is_none()
                    {
                        analysis.add_symbol_def(name);
                    }
                }
                NodeKind::Call { name } => {
                    if !self.ignore_dependencies.contains(name) {
                        analysis.add_symbol_dep(name);
                    }
                }
                // A user include names a header we may generate; system
                // includes are the platform's problem.
                NodeKind::Include { path, system: false } => {
                    if let Some(stem) = Path::new(path).file_stem() {
                        let stem = stem.to_string_lossy();
                        if !self.ignore_dependencies.contains(stem.as_ref()) {
                            analysis.add_symbol_dep(&stem);
                        }
                    }
                }
                _ => {}
            }
        }

        // Calls to functions in the same file are not dependencies.
        analysis.symbol_deps = &analysis.symbol_deps - &analysis.symbol_defs;

        save_record(&record, &analysis).map_err(|message| AnalysisError::Record {
            path: record.clone(),
            message,
        })?;

        Ok(Analysis::Analysed { analysis, record })
    }
}
