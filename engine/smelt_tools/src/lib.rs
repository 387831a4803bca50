//! The tools Smelt drives: compilers, linkers, archivers and the PSyclone
//! code generator.
//!
//! Everything here is explicitly constructed and explicitly passed. A
//! [`ToolRepository`] holds what is known to exist on a machine, a
//! [`ToolBox`] holds what one build actually selected, and nothing is a
//! process-wide singleton, so builds and tests can carry entirely separate
//! tool sets.

pub mod archiver;
pub mod category;
pub mod compiler;
pub mod flags;
pub mod linker;
pub mod psyclone;
pub mod repository;
pub mod tool;
pub mod toolbox;

pub use archiver::Archiver;
pub use category::Category;
pub use compiler::Compiler;
pub use flags::{Flags, ProfileFlags};
pub use linker::Linker;
pub use psyclone::Psyclone;
pub use repository::{AnyTool, ToolRepository};
pub use tool::{Availability, Tool};
pub use toolbox::ToolBox;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("command not found: '{command}'")]
    CommandNotFound { command: String },

    #[error(
        "command failed{}: '{command}'\nstdout:\n{stdout}\nstderr:\n{stderr}",
        code.map(|c| format!(" with exit code {c}")).unwrap_or_default()
    )]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("tool '{tool}' is not available: {diagnostic}")]
    NotAvailable { tool: String, diagnostic: String },

    #[error("unable to parse a version for '{tool}' from: {output}")]
    InvalidVersion { tool: String, output: String },

    #[error("flag profile '{profile}' is not defined")]
    ProfileNotDefined { profile: String },

    #[error("flag profile '{profile}' would inherit from itself")]
    ProfileCycle { profile: String },

    #[error("tool '{tool}' is a {category}, expected a {expected}")]
    Mismatch {
        tool: String,
        category: Category,
        expected: Category,
    },

    #[error("no tool selected for category {category}")]
    NoToolForCategory { category: Category },

    #[error("no tool named '{name}' registered for category {category}")]
    UnknownTool { name: String, category: Category },

    #[error("linker '{linker}' knows no flags for library '{library}'")]
    UnknownLibrary { library: String, linker: String },
}
