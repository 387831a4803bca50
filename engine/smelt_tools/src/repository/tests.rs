use pretty_assertions::assert_eq;

use super::*;

#[test]
fn default_repository_registers_linkers_per_compiler() {
    let repo = ToolRepository::with_default_tools();

    let gfortran = repo.get_tool(Category::FortranCompiler, "gfortran").unwrap();
    assert_eq!(gfortran.category(), Category::FortranCompiler);

    let linker = repo.get_tool(Category::Linker, "linker-gfortran").unwrap();
    let AnyTool::Linker(linker) = linker else {
        panic!("expected a linker");
    };
    assert_eq!(linker.compiler().name(), "gfortran");
}

#[test]
fn unknown_tool_is_an_error() {
    let repo = ToolRepository::with_default_tools();
    let err = repo
        .get_tool(Category::FortranCompiler, "crayftn")
        .unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool { name, .. } if name == "crayftn"));
}

#[test]
fn default_selection_prefers_registration_order() {
    let repo = ToolRepository::with_default_tools();
    let tool = repo.get_default(Category::FortranCompiler, false).unwrap();
    assert_eq!(tool.name(), "gfortran");
}

#[test]
fn mpi_default_selects_a_wrapper() {
    let repo = ToolRepository::with_default_tools();

    let tool = repo.get_default(Category::FortranCompiler, true).unwrap();
    assert_eq!(tool.name(), "mpif90-gfortran");
    let tool = repo.get_default(Category::CCompiler, true).unwrap();
    assert_eq!(tool.name(), "mpicc-gcc");

    // The matching linker is the one built on the wrapper.
    let linker = repo.get_default(Category::Linker, true).unwrap();
    assert_eq!(linker.name(), "linker-mpif90-gfortran");
}

#[test]
fn mpi_default_requires_an_mpi_compiler() {
    let mut repo = ToolRepository::new();
    repo.add_compiler(std::sync::Arc::new(
        Compiler::new("gfortran", "gfortran", "gnu", Category::FortranCompiler),
    ));

    assert!(matches!(
        repo.get_default(Category::FortranCompiler, true),
        Err(ToolError::NoToolForCategory { .. })
    ));
    assert!(matches!(
        repo.get_default(Category::Linker, true),
        Err(ToolError::NoToolForCategory { .. })
    ));
}

#[test]
fn empty_category_has_no_default() {
    let repo = ToolRepository::new();
    assert!(matches!(
        repo.get_default(Category::Archiver, false),
        Err(ToolError::NoToolForCategory { .. })
    ));
}
