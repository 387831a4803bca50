//! Extracts kernel references from PSyclone x90 algorithm files.
//!
//! An x90 file is Fortran with `invoke` calls naming kernel metadata. The
//! kernel names feed the PSyclone transformation hash: if a referenced
//! kernel source changes, the transformed output must be regenerated.

use std::path::Path;
use std::sync::Arc;

use smelt_hash::file_checksum;

use crate::analysed::AnalysedX90;
use crate::parser::SourceParser;
use crate::tree::NodeKind;
use crate::AnalysisError;

pub struct X90Analyser {
    parser: Arc<dyn SourceParser>,
}

impl X90Analyser {
    #[must_use]
    pub fn new(parser: Arc<dyn SourceParser>) -> Self {
        Self { parser }
    }

    /// X90 analysis is not record-cached: the transform step keys its own
    /// prebuild on the combined kernel hashes instead.
    pub fn run(&self, fpath: &Path) -> Result<AnalysedX90, AnalysisError> {
        let file_hash = file_checksum(fpath)?;
        let tree = self.parser.parse(fpath)?;

        let mut analysis = AnalysedX90::new(fpath, file_hash);
        for node in tree.nodes() {
            if let NodeKind::Call { name } = tree.kind(node) {
                analysis.kernel_deps.insert(name.to_lowercase());
            }
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::parser::{ParseError, SourceParser};
    use crate::tree::{NodeKind, ParseTree};

    use super::*;

    struct StubParser(ParseTree);

    impl SourceParser for StubParser {
        fn parse(&self, _path: &Path) -> Result<ParseTree, ParseError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn kernel_names_are_collected_lowercase() {
        let mut tree = ParseTree::new();
        let p = tree.push(tree.root(), NodeKind::Program { name: "alg".into() });
        tree.push(p, NodeKind::Call { name: "Matrix_Vector_Kernel_Type".into() });
        tree.push(p, NodeKind::Call { name: "setval_c".into() });

        let dir = tempfile::tempdir().unwrap();
        let fpath = dir.path().join("alg.x90");
        let mut file = std::fs::File::create(&fpath).unwrap();
        file.write_all(b"placeholder\n").unwrap();

        let analysis = X90Analyser::new(Arc::new(StubParser(tree)))
            .run(&fpath)
            .unwrap();
        assert_eq!(
            analysis.kernel_deps,
            ["matrix_vector_kernel_type".to_string(), "setval_c".to_string()]
                .into_iter()
                .collect()
        );
    }
}
