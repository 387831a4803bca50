//! The PSyclone code generator, treated as an opaque collaborator.
//!
//! PSyclone changed its command line at 3.0.0: the API selection flag was
//! renamed and the per-output flags were collapsed. Smelt never executes the
//! transformation itself; it only has to spell the invocation correctly, and
//! every version-dependent spelling lives in [`Psyclone::transform_args`] so
//! the rest of the engine is oblivious to the tool's CLI history.

use std::path::Path;

use parking_lot::Mutex;

use crate::category::Category;
use crate::tool::Tool;
use crate::ToolError;

/// The CLI spelling changed at this release.
const NEW_CLI_VERSION: [u32; 3] = [3, 0, 0];

#[derive(Debug)]
pub struct Psyclone {
    tool: Tool,
    version: Mutex<Option<Vec<u32>>>,
}

impl Psyclone {
    #[must_use]
    pub fn new(exec_name: &str) -> Self {
        Self {
            tool: Tool::new("psyclone", exec_name, Category::Psyclone),
            version: Mutex::new(None),
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
        *self.version.lock() = Some(version.clone());
        Ok(version)
    }

    /// The full argument list for one transformation, correct for the
    /// installed version. This is the only place that may inspect the
    /// version to pick a flag spelling.
    pub fn transform_args(
        &self,
        x90: &Path,
        psy_out: &Path,
        alg_out: &Path,
        transformation_script: Option<&Path>,
    ) -> Result<Vec<String>, ToolError> {
        let version = self.version()?;
        let new_cli = version.as_slice() >= NEW_CLI_VERSION.as_slice();

        let mut args: Vec<String> = if new_cli {
            vec!["--psykal-dsl".to_string(), "lfric".to_string()]
        } else {
            vec!["-api".to_string(), "dynamo0.3".to_string()]
        };
        args.extend([
            "-l".to_string(),
            "all".to_string(),
            "-opsy".to_string(),
            psy_out.to_string_lossy().into_owned(),
            "-oalg".to_string(),
            alg_out.to_string_lossy().into_owned(),
        ]);
        if let Some(script) = transformation_script {
            args.push("-s".to_string());
            args.push(script.to_string_lossy().into_owned());
        }
        args.push(x90.to_string_lossy().into_owned());
        Ok(args)
    }

    pub fn transform(
        &self,
        x90: &Path,
        psy_out: &Path,
        alg_out: &Path,
        transformation_script: Option<&Path>,
    ) -> Result<(), ToolError> {
        let args = self.transform_args(x90, psy_out, alg_out, transformation_script)?;
        self.tool.run(&args, "", None)?;
        Ok(())
    }
}

fn parse_version(output: &str) -> Option<Vec<u32>> {
    output
        .split_whitespace()
        .filter_map(|token| {
            let token = token.trim_matches(|c: char| !c.is_ascii_digit());
            let parts: Option<Vec<u32>> =
                token.split('.').map(|part| part.parse::<u32>().ok()).collect();
            parts.filter(|parts| parts.len() >= 2)
        })
        .next()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::tool::tests::fake_tool;

    use super::*;

    fn fake_psyclone(dir: &Path, version: &str) -> Psyclone {
        let exec = fake_tool(
            dir,
            "fakepsyclone",
            &format!(r#"if [ "$1" = "--version" ]; then echo "PSyclone version: {version}"; exit 0; fi"#),
        );
        Psyclone::new(exec.to_str().unwrap())
    }

    #[test]
    fn old_versions_use_the_api_flag() {
        let dir = tempfile::tempdir().unwrap();
        let psyclone = fake_psyclone(dir.path(), "2.5.0");

        let args = psyclone
            .transform_args(
                Path::new("alg.x90"),
                Path::new("alg_psy.f90"),
                Path::new("alg.f90"),
                None,
            )
            .unwrap();
        assert_eq!(
            args,
            vec![
                "-api", "dynamo0.3", "-l", "all", "-opsy", "alg_psy.f90", "-oalg", "alg.f90",
                "alg.x90"
            ]
        );
    }

    #[test]
    fn new_versions_use_the_dsl_flag() {
        let dir = tempfile::tempdir().unwrap();
        let psyclone = fake_psyclone(dir.path(), "3.1.0");

        let args = psyclone
            .transform_args(
                Path::new("alg.x90"),
                Path::new("alg_psy.f90"),
                Path::new("alg.f90"),
                Some(Path::new("opt.py")),
            )
            .unwrap();
        assert_eq!(args[..2], ["--psykal-dsl".to_string(), "lfric".to_string()]);
        assert!(args.windows(2).any(|w| w == ["-s", "opt.py"]));
    }
}
