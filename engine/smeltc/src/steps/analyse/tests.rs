use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use rustc_hash::FxHashMap;
use smelt_source::{NodeKind, ParseError, ParseTree};
use smelt_tools::ToolBox;
use smelt_tree::TreeError;

use super::*;

/// Maps file names to canned trees; unknown files fail to parse.
#[derive(Default)]
struct StubParser {
    trees: FxHashMap<String, ParseTree>,
}

impl StubParser {
    fn insert(&mut self, name: &str, tree: ParseTree) {
        self.trees.insert(name.to_string(), tree);
    }
}

impl SourceParser for StubParser {
    fn parse(&self, path: &Path) -> Result<ParseTree, ParseError> {
        let name = path.file_name().unwrap().to_string_lossy();
        self.trees
            .get(name.as_ref())
            .cloned()
            .ok_or_else(|| ParseError {
                message: "syntax error".to_string(),
                fpath: path.to_path_buf(),
                line: Some(1),
            })
    }
}

fn program_tree(name: &str, uses: &[&str]) -> ParseTree {
    let mut tree = ParseTree::new();
    let p = tree.push(tree.root(), NodeKind::Program { name: name.into() });
    for used in uses {
        tree.push(
            p,
            NodeKind::Use {
                module: (*used).into(),
                openmp_sentinel: false,
            },
        );
    }
    tree
}

fn module_tree(name: &str) -> ParseTree {
    let mut tree = ParseTree::new();
    tree.push(tree.root(), NodeKind::Module { name: name.into() });
    tree
}

struct Fixture {
    _dir: tempfile::TempDir,
    config: BuildConfig,
    sources: Vec<PathBuf>,
}

fn fixture(files: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BuildConfig::new("proj", dir.path(), ToolBox::new());
    config.prepare().unwrap();

    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let sources = files
        .iter()
        .map(|name| {
            let fpath = src.join(name);
            fs::write(&fpath, format!("content of {name}\n")).unwrap();
            fpath
        })
        .collect();
    Fixture {
        _dir: dir,
        config,
        sources,
    }
}

fn args(parser: StubParser, fortran_sources: Vec<PathBuf>) -> AnalyseArgs {
    let parser: Arc<dyn SourceParser> = Arc::new(parser);
    AnalyseArgs {
        fortran_parser: parser.clone(),
        c_parser: parser,
        fortran_sources,
        c_sources: vec![],
        root_symbols: vec![],
        library_mode: false,
        unreferenced_deps: vec![],
        ignore_dependencies: vec![],
        workarounds: vec![],
    }
}

#[test]
fn programs_become_targets_with_resolved_trees() {
    let mut fixture = fixture(&["main.f90", "util.f90"]);
    let mut parser = StubParser::default();
    parser.insert("main.f90", program_tree("main", &["util_mod"]));
    parser.insert("util.f90", module_tree("util_mod"));

    analyse(&mut fixture.config, args(parser, fixture.sources.clone())).unwrap();

    let trees = &fixture.config.artefacts.build_trees;
    assert_eq!(trees.len(), 1);
    let tree = &trees[&Some("main".to_string())];
    assert_eq!(tree.len(), 2);

    let main = &tree[&fixture.sources[0]];
    assert_eq!(
        main.file_deps(),
        &[fixture.sources[1].clone()].into_iter().collect()
    );
}

#[test]
fn requested_roots_override_program_discovery() {
    let mut fixture = fixture(&["main.f90", "util.f90"]);
    let mut parser = StubParser::default();
    parser.insert("main.f90", program_tree("main", &[]));
    parser.insert("util.f90", module_tree("util_mod"));

    let mut analyse_args = args(parser, fixture.sources.clone());
    analyse_args.root_symbols = vec!["util_mod".to_string()];
    analyse(&mut fixture.config, analyse_args).unwrap();

    let trees = &fixture.config.artefacts.build_trees;
    assert_eq!(trees.len(), 1);
    assert!(trees.contains_key(&Some("util_mod".to_string())));
}

#[test]
fn library_mode_builds_one_unnamed_tree() {
    let mut fixture = fixture(&["a.f90", "b.f90"]);
    let mut parser = StubParser::default();
    parser.insert("a.f90", module_tree("a_mod"));
    parser.insert("b.f90", module_tree("b_mod"));

    let mut analyse_args = args(parser, fixture.sources.clone());
    analyse_args.library_mode = true;
    analyse(&mut fixture.config, analyse_args).unwrap();

    let trees = &fixture.config.artefacts.build_trees;
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[&None].len(), 2);
}

#[test]
fn duplicate_symbols_abort_the_batch() {
    let mut fixture = fixture(&["a.f90", "b.f90"]);
    let mut parser = StubParser::default();
    parser.insert("a.f90", module_tree("clash_mod"));
    parser.insert("b.f90", module_tree("clash_mod"));

    let err = analyse(&mut fixture.config, args(parser, fixture.sources.clone())).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Tree(TreeError::DuplicateSymbol { symbol, .. }) if symbol == "clash_mod"
    ));
}

#[test]
fn parse_failures_are_aggregated_not_fatal_per_file() {
    let mut fixture = fixture(&["good.f90", "bad.f90", "worse.f90"]);
    let mut parser = StubParser::default();
    // Only good.f90 parses.
    parser.insert("good.f90", program_tree("main", &[]));

    let err = analyse(&mut fixture.config, args(parser, fixture.sources.clone())).unwrap_err();
    assert!(matches!(
        err,
        BuildError::AnalysisFailures { failed: 2, total: 3 }
    ));
}

#[test]
fn workaround_substitutes_for_an_unparseable_file() {
    let mut fixture = fixture(&["main.f90", "legacy.f90"]);
    let mut parser = StubParser::default();
    parser.insert("main.f90", program_tree("main", &["legacy_mod"]));
    // legacy.f90 has no tree, so parsing it fails.

    let mut workaround = AnalysedFortran::new(&fixture.sources[1], Default::default());
    workaround.add_module_def("legacy_mod");

    let mut analyse_args = args(parser, fixture.sources.clone());
    analyse_args.workarounds = vec![workaround];
    analyse(&mut fixture.config, analyse_args).unwrap();

    let tree = &fixture.config.artefacts.build_trees[&Some("main".to_string())];
    assert_eq!(tree.len(), 2);

    // The workaround was hashed from the real file, not left at the default.
    let legacy = tree[&fixture.sources[1]].as_fortran().unwrap();
    assert_ne!(legacy.file_hash, Default::default());
}

#[test]
fn analysis_records_are_marked_current() {
    let mut fixture = fixture(&["main.f90"]);
    let mut parser = StubParser::default();
    parser.insert("main.f90", program_tree("main", &[]));

    analyse(&mut fixture.config, args(parser, fixture.sources.clone())).unwrap();

    let current = &fixture.config.artefacts.current_prebuilds;
    assert_eq!(current.len(), 1);
    let record = current.iter().next().unwrap();
    assert!(record.starts_with(fixture.config.prebuild_folder()));
    assert!(record.extension().is_some_and(|e| e == "an"));
}
