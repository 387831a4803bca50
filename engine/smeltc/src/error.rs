//! The build-level error taxonomy.

use std::path::PathBuf;

use smelt_tools::ToolError;
use smelt_tree::TreeError;

/// A file the scheduler can never compile, with the dependencies that are
/// blocking it.
#[derive(Debug)]
pub struct StuckFile {
    pub fpath: PathBuf,
    pub waiting_on: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Duplicate symbols and missing roots, straight from tree construction.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A tool failed outside any per-file context (probes, version queries).
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("failed to compile '{}': {source}", fpath.display())]
    Compile {
        fpath: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("failed to link '{target}': {source}")]
    Link {
        target: String,
        #[source]
        source: ToolError,
    },

    #[error("failed to archive objects for '{target}': {source}")]
    Archive {
        target: String,
        #[source]
        source: ToolError,
    },

    /// The ready set is empty but files remain. A true dependency cycle, or
    /// a dependency that can never be satisfied.
    #[error("unable to compile anything further; stuck files:\n{}", stuck_report(stuck))]
    Deadlock { stuck: Vec<StuckFile> },

    #[error("no target objects defined")]
    NoLinkTargets,

    /// Per-file analysis failures, reported in aggregate once the whole
    /// batch has run.
    #[error("{failed} of {total} source files failed to analyse")]
    AnalysisFailures { failed: usize, total: usize },

    /// Every failure from one parallel section, so a single run reports all
    /// broken files rather than the first.
    #[error("{label}: {} failure(s):\n{}", errors.len(), error_report(errors))]
    Multi {
        label: String,
        errors: Vec<BuildError>,
    },

    #[error("{message}: '{}'", path.display())]
    Io { path: PathBuf, message: String },
}

fn stuck_report(stuck: &[StuckFile]) -> String {
    stuck
        .iter()
        .map(|s| {
            let deps = s
                .waiting_on
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("  {} (waiting on: {deps})", s.fpath.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn error_report(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl BuildError {
    /// Collapse a batch of failures: zero is success, one is itself, more
    /// become a `Multi`.
    pub fn from_batch(label: &str, mut errors: Vec<BuildError>) -> Result<(), BuildError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(BuildError::Multi {
                label: label.to_string(),
                errors,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deadlock_message_enumerates_stuck_files() {
        let err = BuildError::Deadlock {
            stuck: vec![StuckFile {
                fpath: PathBuf::from("/src/a.f90"),
                waiting_on: vec![PathBuf::from("/src/b.f90")],
            }],
        };
        assert_eq!(
            err.to_string(),
            "unable to compile anything further; stuck files:\n  /src/a.f90 (waiting on: /src/b.f90)"
        );
    }

    #[test]
    fn batch_of_one_is_the_error_itself() {
        let err = BuildError::from_batch("compile", vec![BuildError::NoLinkTargets]).unwrap_err();
        assert!(matches!(err, BuildError::NoLinkTargets));
    }

    #[test]
    fn batch_of_many_reports_every_failure() {
        let err = BuildError::from_batch(
            "compile pass",
            vec![BuildError::NoLinkTargets, BuildError::NoLinkTargets],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("compile pass: 2 failure(s):"));
        assert_eq!(message.matches("no target objects defined").count(), 2);
    }
}
