//! The registry of tools known to exist, and the handle type that names
//! one of them.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::archiver::Archiver;
use crate::category::Category;
use crate::compiler::Compiler;
use crate::linker::Linker;
use crate::psyclone::Psyclone;
use crate::ToolError;

/// A handle to any registered tool. Cheap to clone; the tools themselves
/// are shared.
#[derive(Debug, Clone)]
pub enum AnyTool {
    Compiler(Arc<Compiler>),
    Linker(Arc<Linker>),
    Archiver(Arc<Archiver>),
    Psyclone(Arc<Psyclone>),
}

impl AnyTool {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Compiler(c) => c.name(),
            Self::Linker(l) => l.name(),
            Self::Archiver(a) => a.name(),
            Self::Psyclone(p) => p.name(),
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Compiler(c) => c.category(),
            Self::Linker(_) => Category::Linker,
            Self::Archiver(_) => Category::Archiver,
            Self::Psyclone(_) => Category::Psyclone,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            Self::Compiler(c) => c.tool().is_available(),
            Self::Linker(l) => l.compiler().tool().is_available(),
            Self::Archiver(a) => a.tool().is_available(),
            Self::Psyclone(p) => p.tool().is_available(),
        }
    }
}

/// All tools known to a build environment, keyed by category.
///
/// Explicitly constructed and passed around; two repositories never share
/// state, which keeps tests and concurrent builds independent.
#[derive(Debug, Default)]
pub struct ToolRepository {
    tools: FxHashMap<Category, Vec<AnyTool>>,
}

impl ToolRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository populated with the common open and vendor toolchains.
    /// Registering a compiler also registers its linker, and every compiler
    /// gets an MPI driver wrapper.
    #[must_use]
    pub fn with_default_tools() -> Self {
        let mut repo = Self::new();

        let fortran_compilers = [
            Compiler::new("gfortran", "gfortran", "gnu", Category::FortranCompiler)
                .with_openmp_flag("-fopenmp"),
            Compiler::new("ifort", "ifort", "intel-classic", Category::FortranCompiler)
                .with_openmp_flag("-qopenmp"),
        ];
        let c_compilers = [
            Compiler::new("gcc", "gcc", "gnu", Category::CCompiler)
                .with_openmp_flag("-fopenmp"),
            Compiler::new("icc", "icc", "intel-classic", Category::CCompiler)
                .with_openmp_flag("-qopenmp"),
        ];
        for compiler in fortran_compilers {
            let compiler = Arc::new(compiler);
            let wrapper = Compiler::mpi_wrapper("mpif90", Arc::clone(&compiler));
            repo.add_compiler(compiler);
            repo.add_compiler(Arc::new(wrapper));
        }
        for compiler in c_compilers {
            let compiler = Arc::new(compiler);
            let wrapper = Compiler::mpi_wrapper("mpicc", Arc::clone(&compiler));
            repo.add_compiler(compiler);
            repo.add_compiler(Arc::new(wrapper));
        }

        repo.add_tool(AnyTool::Archiver(Arc::new(Archiver::new("ar", "ar"))));
        repo.add_tool(AnyTool::Psyclone(Arc::new(Psyclone::new("psyclone"))));
        repo
    }

    pub fn add_tool(&mut self, tool: AnyTool) {
        debug!(name = tool.name(), category = %tool.category(), "registering tool");
        self.tools.entry(tool.category()).or_default().push(tool);
    }

    /// Register a compiler and derive its linker.
    pub fn add_compiler(&mut self, compiler: Arc<Compiler>) {
        let linker = Linker::new(Arc::clone(&compiler));
        self.add_tool(AnyTool::Compiler(compiler));
        self.add_tool(AnyTool::Linker(Arc::new(linker)));
    }

    /// Look a tool up by category and name.
    pub fn get_tool(&self, category: Category, name: &str) -> Result<AnyTool, ToolError> {
        self.tools
            .get(&category)
            .into_iter()
            .flatten()
            .find(|tool| tool.name() == name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
                category,
            })
    }

    /// The first registered tool of a category. With `mpi` set, compilers
    /// without MPI support are skipped, and so are linkers built on them.
    pub fn get_default(&self, category: Category, mpi: bool) -> Result<AnyTool, ToolError> {
        self.tools
            .get(&category)
            .into_iter()
            .flatten()
            .find(|tool| {
                if !mpi {
                    return true;
                }
                match tool {
                    AnyTool::Compiler(c) => c.mpi(),
                    AnyTool::Linker(l) => l.compiler().mpi(),
                    AnyTool::Archiver(_) | AnyTool::Psyclone(_) => true,
                }
            })
            .cloned()
            .ok_or(ToolError::NoToolForCategory { category })
    }
}

#[cfg(test)]
mod tests;
