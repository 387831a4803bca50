//! The build steps, in the order a typical build runs them:
//! analyse, compile, archive, link, cleanup.

use std::path::PathBuf;

use crate::config::FlagsConfig;

pub mod analyse;
pub mod archive_objects;
pub mod cleanup_prebuilds;
pub mod compile_c;
pub mod compile_fortran;
pub mod link;

pub use analyse::{analyse, AnalyseArgs};
pub use archive_objects::archive_objects;
pub use cleanup_prebuilds::{cleanup_prebuilds, CleanupArgs};
pub use compile_c::compile_c;
pub use compile_fortran::compile_fortran;
pub use link::{link_exe, link_shared_object, LinkArgs};

/// Arguments shared by the compile steps.
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    pub flags: FlagsConfig,
    /// Root of the source checkout, substituted for `$source` in path
    /// flags.
    pub source_root: PathBuf,
}
