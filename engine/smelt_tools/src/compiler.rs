//! Compilers: version detection, identity hashing and compile invocations.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use smelt_hash::{combine_hashes, string_checksum, ContentHash};

use crate::category::Category;
use crate::flags::Flags;
use crate::tool::Tool;
use crate::ToolError;

/// A Fortran or C compiler, possibly a driver wrapping another compiler.
#[derive(Debug)]
pub struct Compiler {
    tool: Tool,
    suite: String,
    mpi: bool,
    compile_flag: String,
    output_flag: String,
    openmp_flag: Option<String>,
    /// The compiler this driver invokes internally, e.g. `mpif90` around
    /// `gfortran`. The wrapped compiler's profile flags apply to every run.
    wrapped: Option<Arc<Compiler>>,
    version: Mutex<Option<Vec<u32>>>,
}

impl Compiler {
    #[must_use]
    pub fn new(name: &str, exec_name: &str, suite: &str, category: Category) -> Self {
        Self {
            tool: Tool::new(name, exec_name, category),
            suite: suite.to_string(),
            mpi: false,
            compile_flag: "-c".to_string(),
            output_flag: "-o".to_string(),
            openmp_flag: None,
            wrapped: None,
            version: Mutex::new(None),
        }
    }

    /// An MPI driver around an existing compiler: `mpif90` around `gfortran`
    /// becomes `mpif90-gfortran`. The wrapper inherits the suite and OpenMP
    /// flag and keeps a live reference to the wrapped compiler, so flags
    /// added to the wrapped compiler later still reach wrapper invocations.
    #[must_use]
    pub fn mpi_wrapper(exec_name: &str, wrapped: Arc<Compiler>) -> Self {
        Self {
            tool: Tool::new(
                &format!("{exec_name}-{}", wrapped.name()),
                exec_name,
                wrapped.category(),
            ),
            suite: wrapped.suite().to_string(),
            mpi: true,
            compile_flag: wrapped.compile_flag.clone(),
            output_flag: wrapped.output_flag.clone(),
            openmp_flag: wrapped.openmp_flag.clone(),
            wrapped: Some(wrapped),
            version: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_mpi(mut self, mpi: bool) -> Self {
        self.mpi = mpi;
        self
    }

    #[must_use]
    pub fn with_openmp_flag(mut self, flag: &str) -> Self {
        self.openmp_flag = Some(flag.to_string());
        self
    }

    #[must_use]
    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    #[must_use]
    pub fn suite(&self) -> &str {
        &self.suite
    }

    #[must_use]
    pub fn mpi(&self) -> bool {
        self.mpi
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.tool.category()
    }

    #[must_use]
    pub fn openmp_flag(&self) -> Option<&str> {
        self.openmp_flag.as_deref()
    }

    /// The compiler's version, parsed from its version query and cached.
    pub fn version(&self) -> Result<Vec<u32>, ToolError> {
        {
            let cached = self.version.lock();
            if let Some(version) = cached.as_ref() {
                return Ok(version.clone());
            }
        }
        let output = self.tool.query(&["--version".to_string()])?;
        let version = parse_version(&output).ok_or_else(|| ToolError::InvalidVersion {
            tool: self.tool.name().to_string(),
            output: output.lines().next().unwrap_or_default().to_string(),
        })?;
        debug!(tool = %self.tool.name(), ?version, "detected compiler version");
        *self.version.lock() = Some(version.clone());
        Ok(version)
    }

    pub fn version_string(&self) -> Result<String, ToolError> {
        Ok(self
            .version()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("."))
    }

    /// The effective flags of `profile`: the wrapped compiler's first, then
    /// this compiler's own, matching the order they are passed on the
    /// command line.
    pub fn flags_for(&self, profile: &str) -> Result<Flags, ToolError> {
        let mut flags = match &self.wrapped {
            Some(inner) => inner.flags_for(profile)?,
            None => Flags::new(),
        };
        flags.extend(self.tool.profile_flags().flags(profile)?);
        Ok(flags)
    }

    /// The compiler's contribution to every object combo-hash: its name, the
    /// effective profile flags and its exact version. Changing any of these
    /// recompiles everything this compiler built.
    pub fn combo_hash(&self, profile: &str) -> Result<ContentHash, ToolError> {
        let flags = self.flags_for(profile)?;
        Ok(combine_hashes(&[
            string_checksum(self.tool.name()),
            flags.checksum(),
            string_checksum(&self.version_string()?),
        ]))
    }

    /// Compile one file to one object.
    pub fn compile_file(
        &self,
        input: &Path,
        output: &Path,
        add_flags: &Flags,
        openmp: bool,
        profile: &str,
    ) -> Result<(), ToolError> {
        let mut args: Vec<String> = vec![self.compile_flag.clone()];
        if openmp {
            if let Some(flag) = &self.openmp_flag {
                args.push(flag.clone());
            }
        }
        args.extend(add_flags.as_slice().iter().cloned());
        args.push(input.to_string_lossy().into_owned());
        args.push(self.output_flag.clone());
        args.push(output.to_string_lossy().into_owned());

        self.tool.run_with_flags(&self.flags_for(profile)?, &args, None)?;
        Ok(())
    }
}

/// The first dotted-number token in a version banner, e.g.
/// `GNU Fortran (Ubuntu 12.2.0-3) 12.2.0` parses to `[12, 2, 0]`.
fn parse_version(output: &str) -> Option<Vec<u32>> {
    let first_line = output.lines().next()?;
    for token in first_line.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_digit());
        if !token.contains('.') {
            continue;
        }
        let parts: Option<Vec<u32>> = token
            .split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect();
        if let Some(parts) = parts {
            if parts.len() >= 2 {
                return Some(parts);
            }
        }
    }
    None
}
