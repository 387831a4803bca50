use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use super::*;

/// Write an executable shell script standing in for a real tool.
pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn run_returns_stdout_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let exec = fake_tool(dir.path(), "fakecc", r#"echo "args: $@""#);

    let tool = Tool::new("fakecc", exec.to_str().unwrap(), Category::CCompiler);
    let out = tool
        .run(&["-c".to_string(), "in.c".to_string()], "", None)
        .unwrap();
    assert_eq!(out.trim(), "args: -c in.c");
}

#[test]
fn profile_flags_come_before_call_args() {
    let dir = tempfile::tempdir().unwrap();
    let exec = fake_tool(dir.path(), "fakecc", r#"echo "$@""#);

    let mut tool = Tool::new("fakecc", exec.to_str().unwrap(), Category::CCompiler);
    tool.profile_flags_mut().add_flags("", ["-O2", "-g"]).unwrap();

    let out = tool.run(&["input.c".to_string()], "", None).unwrap();
    assert_eq!(out.trim(), "-O2 -g input.c");
}

#[test]
fn failure_carries_command_exit_code_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let exec = fake_tool(
        dir.path(),
        "brokencc",
        // The probe must succeed so the failure comes from the real run.
        r#"[ "$1" = "--version" ] && exit 0; echo "some diagnostic" >&2; exit 3"#,
    );

    let tool = Tool::new("brokencc", exec.to_str().unwrap(), Category::CCompiler);
    let err = tool.run(&["in.c".to_string()], "", None).unwrap_err();
    match err {
        ToolError::CommandFailed { code, stderr, command, .. } => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("some diagnostic"));
            assert!(command.contains("in.c"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_executable_is_unavailable() {
    let tool = Tool::new("ghostcc", "/no/such/ghostcc", Category::CCompiler);

    assert!(!tool.is_available());
    let err = tool.run(&[], "", None).unwrap_err();
    assert!(matches!(err, ToolError::NotAvailable { tool, .. } if tool == "ghostcc"));
}

#[test]
fn probe_outcome_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("probe.log");
    let exec = fake_tool(
        dir.path(),
        "fakecc",
        &format!(r#"echo probed >> "{}""#, log.display()),
    );

    let tool = Tool::new("fakecc", exec.to_str().unwrap(), Category::CCompiler);
    assert!(tool.is_available());
    assert!(tool.is_available());

    let probes = fs::read_to_string(&log).unwrap();
    assert_eq!(probes.lines().count(), 1);
}

#[test]
fn run_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let exec = fake_tool(dir.path(), "fakepwd", "pwd");
    let workdir = dir.path().join("work");
    fs::create_dir(&workdir).unwrap();

    let tool = Tool::new("fakepwd", exec.to_str().unwrap(), Category::Misc);
    let out = tool.run(&[], "", Some(&workdir)).unwrap();
    assert_eq!(
        PathBuf::from(out.trim()).canonicalize().unwrap(),
        workdir.canonicalize().unwrap()
    );
}
