//! The tools one build actually uses.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::archiver::Archiver;
use crate::category::Category;
use crate::compiler::Compiler;
use crate::linker::Linker;
use crate::psyclone::Psyclone;
use crate::repository::AnyTool;
use crate::ToolError;

/// One selected tool per category, passed explicitly into every build step.
#[derive(Debug, Default)]
pub struct ToolBox {
    tools: FxHashMap<Category, AnyTool>,
}

impl ToolBox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a tool; replaces any previous selection for its category.
    pub fn add_tool(&mut self, tool: AnyTool) {
        self.tools.insert(tool.category(), tool);
    }

    #[must_use]
    pub fn contains(&self, category: Category) -> bool {
        self.tools.contains_key(&category)
    }

    fn get(&self, category: Category) -> Result<&AnyTool, ToolError> {
        self.tools
            .get(&category)
            .ok_or(ToolError::NoToolForCategory { category })
    }

    pub fn fortran_compiler(&self) -> Result<Arc<Compiler>, ToolError> {
        match self.get(Category::FortranCompiler)? {
            AnyTool::Compiler(c) => Ok(Arc::clone(c)),
            other => Err(mismatch(other, Category::FortranCompiler)),
        }
    }

    pub fn c_compiler(&self) -> Result<Arc<Compiler>, ToolError> {
        match self.get(Category::CCompiler)? {
            AnyTool::Compiler(c) => Ok(Arc::clone(c)),
            other => Err(mismatch(other, Category::CCompiler)),
        }
    }

    pub fn linker(&self) -> Result<Arc<Linker>, ToolError> {
        match self.get(Category::Linker)? {
            AnyTool::Linker(l) => Ok(Arc::clone(l)),
            other => Err(mismatch(other, Category::Linker)),
        }
    }

    pub fn archiver(&self) -> Result<Arc<Archiver>, ToolError> {
        match self.get(Category::Archiver)? {
            AnyTool::Archiver(a) => Ok(Arc::clone(a)),
            other => Err(mismatch(other, Category::Archiver)),
        }
    }

    pub fn psyclone(&self) -> Result<Arc<Psyclone>, ToolError> {
        match self.get(Category::Psyclone)? {
            AnyTool::Psyclone(p) => Ok(Arc::clone(p)),
            other => Err(mismatch(other, Category::Psyclone)),
        }
    }
}

fn mismatch(tool: &AnyTool, expected: Category) -> ToolError {
    ToolError::Mismatch {
        tool: tool.name().to_string(),
        category: tool.category(),
        expected,
    }
}
