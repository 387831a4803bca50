//! The base subprocess wrapper every concrete tool builds on.

use std::path::Path;
use std::process::Command;

use parking_lot::Mutex;
use tracing::debug;

use crate::category::Category;
use crate::flags::{Flags, ProfileFlags};
use crate::ToolError;

/// Whether a tool can actually be invoked on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable { diagnostic: String },
}

/// A named executable with a category, per-profile flags and a cached
/// availability probe.
#[derive(Debug)]
pub struct Tool {
    name: String,
    exec_name: String,
    category: Category,
    profile_flags: ProfileFlags,
    /// The cheap no-op invocation used to check the tool exists, typically a
    /// version query.
    probe_args: Vec<String>,
    availability: Mutex<Option<Availability>>,
}

impl Tool {
    #[must_use]
    pub fn new(name: &str, exec_name: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            exec_name: exec_name.to_string(),
            category,
            profile_flags: ProfileFlags::new(),
            probe_args: vec!["--version".to_string()],
            availability: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_probe_args(mut self, args: &[&str]) -> Self {
        self.probe_args = args.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn exec_name(&self) -> &str {
        &self.exec_name
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn profile_flags(&self) -> &ProfileFlags {
        &self.profile_flags
    }

    pub fn profile_flags_mut(&mut self) -> &mut ProfileFlags {
        &mut self.profile_flags
    }

    /// Probe the tool once and cache the outcome. Never raises: "not
    /// installed" is a fact about the machine, not an error, until someone
    /// actually tries to run the tool.
    pub fn probe(&self) -> Availability {
        let mut cached = self.availability.lock();
        if let Some(availability) = cached.as_ref() {
            return availability.clone();
        }
        let availability = match Command::new(&self.exec_name).args(&self.probe_args).output() {
            Ok(output) if output.status.success() => Availability::Available,
            Ok(output) => Availability::Unavailable {
                diagnostic: format!(
                    "probe exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            },
            Err(err) => Availability::Unavailable {
                diagnostic: err.to_string(),
            },
        };
        debug!(tool = %self.name, available = availability == Availability::Available, "probed tool");
        *cached = Some(availability.clone());
        availability
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.probe() == Availability::Available
    }

    /// Run the tool with its profile flags followed by `args`, capturing
    /// output. Returns stdout on success.
    pub fn run(
        &self,
        args: &[String],
        profile: &str,
        cwd: Option<&Path>,
    ) -> Result<String, ToolError> {
        let profile_flags = self.profile_flags.flags(profile)?;
        self.run_with_flags(&profile_flags, args, cwd)
    }

    /// Run the bare executable with just `args`. Version and capability
    /// queries go through here; build flags must not leak into them.
    pub fn query(&self, args: &[String]) -> Result<String, ToolError> {
        self.run_with_flags(&Flags::new(), args, None)
    }

    /// Run with `flags` already resolved by the caller. Wrapped compilers
    /// combine two tools' profile flags before invoking.
    pub fn run_with_flags(
        &self,
        flags: &Flags,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<String, ToolError> {
        if let Availability::Unavailable { diagnostic } = self.probe() {
            return Err(ToolError::NotAvailable {
                tool: self.name.clone(),
                diagnostic,
            });
        }

        let mut all_args: Vec<String> = flags.as_slice().to_vec();
        all_args.extend(args.iter().cloned());

        let command_line = format!("{} {}", self.exec_name, all_args.join(" "));
        debug!(tool = %self.name, command = %command_line, "running");

        let mut command = Command::new(&self.exec_name);
        command.args(&all_args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ToolError::CommandNotFound {
                    command: self.exec_name.clone(),
                }
            } else {
                ToolError::CommandFailed {
                    command: command_line.clone(),
                    code: None,
                    stdout: String::new(),
                    stderr: err.to_string(),
                }
            }
        })?;

        if !output.status.success() {
            return Err(ToolError::CommandFailed {
                command: command_line,
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod tests;
