//! The Smelt build engine: incremental compilation for Fortran/C scientific
//! software.
//!
//! A build is a [`BuildConfig`] plus a sequence of steps. The analyse step
//! turns sources into build trees, the compile steps schedule multi-pass
//! compilation against the content-addressed prebuild cache, and the
//! archive/link steps produce the final targets. Partial progress lives in
//! the prebuild directory, so an interrupted or failed build resumes from
//! where it stopped.

pub mod artefacts;
pub mod config;
pub mod error;
pub mod logging;
pub mod prebuild;
pub mod steps;

pub use artefacts::ArtefactStore;
pub use config::{AddFlags, BuildConfig, FlagsConfig};
pub use error::BuildError;
pub use prebuild::CompiledFile;
