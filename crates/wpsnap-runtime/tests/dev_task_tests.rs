//! Dev-target behavior, observed through a fake interpreter that
//! records every argument list it is invoked with.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use wpsnap_runtime::{DevTarget, TaskError, TaskRunner};

fn fake_interpreter(dir: &Path, log: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("python-stub");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> \"{}\"\nexit {}\n",
        log.display(),
        exit_code
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn runner(interpreter: PathBuf) -> TaskRunner {
    TaskRunner::new(
        interpreter,
        PathBuf::from("src"),
        PathBuf::from("requirements.in"),
        PathBuf::from("requirements.txt"),
    )
}

fn log_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(ToString::to_string)
        .collect()
}

#[tokio::test]
async fn isort_and_black_run_over_the_source_dir() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 0));

    tasks.run(DevTarget::Isort).await.unwrap();
    tasks.run(DevTarget::Black).await.unwrap();

    assert_eq!(log_lines(&log), vec!["-m isort src", "-m black src"]);
}

#[tokio::test]
async fn format_runs_isort_before_black() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 0));

    tasks.run(DevTarget::Format).await.unwrap();

    assert_eq!(log_lines(&log), vec!["-m isort src", "-m black src"]);
}

#[tokio::test]
async fn venv_regenerates_requirements_before_installing() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 0));

    tasks.run(DevTarget::Venv).await.unwrap();

    assert_eq!(
        log_lines(&log),
        vec![
            "-m piptools compile --output-file requirements.txt requirements.in",
            "-m pip install -r requirements.txt",
        ]
    );
}

#[tokio::test]
async fn requirements_rerun_unconditionally() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 0));

    tasks.run(DevTarget::Requirements).await.unwrap();
    tasks.run(DevTarget::Requirements).await.unwrap();

    assert_eq!(log_lines(&log).len(), 2);
}

#[tokio::test]
async fn nonzero_exit_is_the_targets_own_failure() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 3));

    let err = tasks.run(DevTarget::Black).await.unwrap_err();
    assert!(matches!(
        err,
        TaskError::ToolFailed {
            tool: "black",
            code: Some(3)
        }
    ));
}

#[tokio::test]
async fn format_stops_at_the_first_failing_tool() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tasks = runner(fake_interpreter(dir.path(), &log, 1));

    let err = tasks.run(DevTarget::Format).await.unwrap_err();
    assert!(matches!(err, TaskError::ToolFailed { tool: "isort", .. }));
    // black was never reached
    assert_eq!(log_lines(&log), vec!["-m isort src"]);
}

#[tokio::test]
async fn missing_interpreter_is_reported_with_the_env_hint() {
    let tasks = runner(PathBuf::from("/nonexistent/wpsnap-python"));
    let err = tasks.run(DevTarget::Isort).await.unwrap_err();
    assert!(matches!(err, TaskError::Interpreter { .. }));
    assert!(err.to_string().contains("PYTHON"));
}
