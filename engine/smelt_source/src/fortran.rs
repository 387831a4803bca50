//! Extracts definitions and dependencies from parsed Fortran.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use smelt_hash::file_checksum;

use crate::analysed::{record_path, save_record, Analysis, AnalysedFortran};
use crate::parser::SourceParser;
use crate::tree::{NodeId, NodeKind, ParseTree};
use crate::AnalysisError;

/// Modules provided by the compiler itself; never dependencies.
const INTRINSIC_MODULES: &[&str] = &[
    "iso_c_binding",
    "iso_fortran_env",
    "ieee_arithmetic",
    "ieee_exceptions",
    "ieee_features",
    "omp_lib",
    "omp_lib_kinds",
];

/// Walks a Fortran parse tree and records what the file defines and uses.
///
/// Results are cached on disk per content hash, so re-analysing an unchanged
/// file is a single record read.
pub struct FortranAnalyser {
    parser: Arc<dyn SourceParser>,
    /// When false, `!$ use` sentinel lines are treated as comments.
    openmp: bool,
    /// Lowercase symbol names to never record as dependencies.
    ignore_dependencies: FxHashSet<String>,
}

impl FortranAnalyser {
    #[must_use]
    pub fn new(parser: Arc<dyn SourceParser>, openmp: bool) -> Self {
        Self {
            parser,
            openmp,
            ignore_dependencies: FxHashSet::default(),
        }
    }

    /// Names here are dropped from symbol and module dependencies. Useful
    /// for symbols provided by external libraries the resolver cannot see.
    pub fn ignore_dependency(&mut self, name: &str) {
        self.ignore_dependencies.insert(name.to_lowercase());
    }

    /// Analyse one file, reusing a previous record if the content is
    /// unchanged.
    pub fn run(
        &self,
        fpath: &Path,
        prebuild_dir: &Path,
    ) -> Result<Analysis<AnalysedFortran>, AnalysisError> {
        let file_hash = file_checksum(fpath)?;
        let record = record_path(prebuild_dir, fpath, file_hash);

        if let Some(previous) = crate::analysed::load_record::<AnalysedFortran>(&record) {
            debug!(fpath = %fpath.display(), "reusing analysis record");
            return Ok(Analysis::Analysed {
                analysis: previous,
                record,
            });
        }

        let tree = self.parser.parse(fpath)?;
        if tree.is_empty_source() {
            debug!(fpath = %fpath.display(), "empty source");
            return Ok(Analysis::EmptySource);
        }

        let mut analysis = AnalysedFortran::new(fpath, file_hash);
        let procedures = procedure_defs(&tree);

        for node in tree.nodes() {
            match tree.kind(node) {
                NodeKind::Module { name } => analysis.add_module_def(name),
                NodeKind::Program { name } => analysis.add_program_def(name),
                NodeKind::Subroutine { name } | NodeKind::Function { name } => {
                    // Procedures inside a module are only reachable through
                    // the module, so they are not global symbols themselves.
                    if tree
                        .find_ancestor(node, |k| matches!(k, NodeKind::Module { .. }))
                        .is_none()
                    {
                        analysis.add_symbol_def(name);
                    }
                }
                NodeKind::Use {
                    module,
                    openmp_sentinel,
                } => {
                    if *openmp_sentinel && !self.openmp {
                        continue;
                    }
                    let lower = module.to_lowercase();
                    if INTRINSIC_MODULES.contains(&lower.as_str())
                        || self.ignore_dependencies.contains(&lower)
                    {
                        continue;
                    }
                    analysis.add_module_dep(module);
                }
                NodeKind::Call { name } => {
                    let lower = name.to_lowercase();
                    if self.ignore_dependencies.contains(&lower) {
                        continue;
                    }
                    if !is_internal_call(&tree, node, &lower, &procedures) {
                        analysis.add_symbol_dep(name);
                    }
                }
                NodeKind::BindDecl { name } => analysis.add_symbol_def(name),
                NodeKind::Comment { text } => {
                    self.process_comment(fpath, text, &mut analysis);
                }
                NodeKind::Root | NodeKind::Include { .. } => {}
            }
        }

        save_record(&record, &analysis).map_err(|message| AnalysisError::Record {
            path: record.clone(),
            message,
        })?;

        Ok(Analysis::Analysed { analysis, record })
    }

    /// Handle the legacy `DEPENDS ON:` comment convention. An `.o` name is a
    /// file-level dependency on a C object; anything else is a symbol.
    fn process_comment(&self, fpath: &Path, text: &str, analysis: &mut AnalysedFortran) {
        let Some(dep) = depends_on_target(text) else {
            return;
        };
        warn!(
            fpath = %fpath.display(),
            dep,
            "deprecated 'DEPENDS ON:' comment found"
        );
        let lower = dep.to_lowercase();
        if self.ignore_dependencies.contains(&lower) {
            return;
        }
        if lower.ends_with(".o") {
            analysis.mo_commented_file_deps.insert(lower);
        } else {
            analysis.add_symbol_dep(&lower);
        }
    }
}

/// The first token after a case-insensitive `DEPENDS ON:` marker, if any.
fn depends_on_target(comment: &str) -> Option<&str> {
    let lower = comment.to_lowercase();
    let idx = lower.find("depends on:")?;
    let rest = &comment[idx + "depends on:".len()..];
    rest.split_whitespace().next().filter(|s| !s.is_empty())
}

/// Every procedure definition in the tree, with the program unit enclosing
/// it. Names are lowercased.
fn procedure_defs(tree: &ParseTree) -> Vec<(String, Option<NodeId>)> {
    tree.nodes()
        .filter(|&n| tree.kind(n).is_procedure())
        .map(|n| {
            let name = tree
                .kind(n)
                .name()
                .unwrap_or_default()
                .to_lowercase();
            let enclosing = tree.find_ancestor(n, NodeKind::is_program_unit);
            (name, enclosing)
        })
        .collect()
}

/// A call is internal when a same-named procedure is defined in a scope
/// enclosing the call site. This covers `contains` procedures and calls
/// between siblings of one module; neither is an external dependency.
fn is_internal_call(
    tree: &ParseTree,
    call: NodeId,
    name: &str,
    procedures: &[(String, Option<NodeId>)],
) -> bool {
    procedures.iter().any(|(proc_name, enclosing)| {
        proc_name == name
            && enclosing.is_some_and(|unit| tree.ancestors(call).any(|a| a == unit))
    })
}
