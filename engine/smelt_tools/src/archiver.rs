//! Object archivers (`ar`).

use std::path::{Path, PathBuf};

use crate::category::Category;
use crate::tool::Tool;
use crate::ToolError;

#[derive(Debug)]
pub struct Archiver {
    tool: Tool,
}

impl Archiver {
    #[must_use]
    pub fn new(name: &str, exec_name: &str) -> Self {
        Self {
            tool: Tool::new(name, exec_name, Category::Archiver),
        }
    }

    #[must_use]
    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    /// Create (or replace) an archive containing `objects`, sorted for a
    /// reproducible member order.
    pub fn create_archive(&self, objects: &[PathBuf], out: &Path) -> Result<PathBuf, ToolError> {
        let mut sorted: Vec<&PathBuf> = objects.iter().collect();
        sorted.sort();

        let mut args: Vec<String> = vec!["cr".to_string(), out.to_string_lossy().into_owned()];
        args.extend(sorted.iter().map(|o| o.to_string_lossy().into_owned()));

        self.tool.run(&args, "", None)?;
        Ok(out.to_path_buf())
    }
}
