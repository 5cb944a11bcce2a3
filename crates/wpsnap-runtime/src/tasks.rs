//! Developer-workflow targets.
//!
//! These mirror the repository's build-automation targets: import
//! sorting and code formatting over the Python sources, regenerating
//! the pinned requirements file and installing it into the active
//! environment. Every target is a direct invocation of `<interpreter>
//! -m <tool>` with fixed arguments; the interpreter is chosen by the
//! `PYTHON` environment variable and falls back to `python3` from the
//! search path. Output passes straight through to the terminal and a
//! non-zero exit is the target's own failure, with no retry or
//! recovery.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Environment variable selecting the interpreter for all targets.
pub const INTERPRETER_ENV: &str = "PYTHON";

/// Conventional interpreter name used when the variable is unset.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// A named developer-workflow target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevTarget {
    /// Run `isort` then `black`.
    Format,
    /// Reorder imports recursively in the source directory.
    Isort,
    /// Format the source directory in place.
    Black,
    /// Install packages from the pinned requirements file, after
    /// regenerating it.
    Venv,
    /// Regenerate the pinned requirements file. Always re-runs.
    Requirements,
}

/// Errors from running a dev target.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The interpreter could not be launched.
    #[error(
        "could not launch {interpreter}: {source} (set {INTERPRETER_ENV} to pick another interpreter)"
    )]
    Interpreter {
        /// Interpreter path as invoked.
        interpreter: String,
        /// Underlying launch failure.
        #[source]
        source: std::io::Error,
    },

    /// The delegated tool exited non-zero.
    #[error("{tool} exited with status {code:?}")]
    ToolFailed {
        /// Python module that was run.
        tool: &'static str,
        /// Exit code, when the process was not killed by a signal.
        code: Option<i32>,
    },
}

/// Runs the developer-workflow targets with fixed paths.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    interpreter: PathBuf,
    src_dir: PathBuf,
    requirements_in: PathBuf,
    requirements_txt: PathBuf,
}

impl TaskRunner {
    /// Runner with an explicit interpreter.
    pub fn new(
        interpreter: PathBuf,
        src_dir: PathBuf,
        requirements_in: PathBuf,
        requirements_txt: PathBuf,
    ) -> Self {
        Self {
            interpreter,
            src_dir,
            requirements_in,
            requirements_txt,
        }
    }

    /// Runner with the interpreter picked from the environment:
    /// `$PYTHON` when set, otherwise `python3` from the search path.
    pub fn from_env(src_dir: PathBuf, requirements_in: PathBuf, requirements_txt: PathBuf) -> Self {
        let interpreter = std::env::var_os(INTERPRETER_ENV)
            .map(PathBuf::from)
            .or_else(|| which::which(DEFAULT_INTERPRETER).ok())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERPRETER));
        Self::new(interpreter, src_dir, requirements_in, requirements_txt)
    }

    /// The interpreter this runner launches tools with.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Run one target to completion.
    pub async fn run(&self, target: DevTarget) -> Result<(), TaskError> {
        match target {
            DevTarget::Format => {
                self.isort().await?;
                self.black().await
            }
            DevTarget::Isort => self.isort().await,
            DevTarget::Black => self.black().await,
            DevTarget::Venv => {
                // The pinned file is always considered out of date.
                self.requirements().await?;
                self.venv().await
            }
            DevTarget::Requirements => self.requirements().await,
        }
    }

    async fn isort(&self) -> Result<(), TaskError> {
        self.module("isort", [self.src_dir.as_os_str()]).await
    }

    async fn black(&self) -> Result<(), TaskError> {
        self.module("black", [self.src_dir.as_os_str()]).await
    }

    async fn requirements(&self) -> Result<(), TaskError> {
        self.module(
            "piptools",
            [
                OsStr::new("compile"),
                OsStr::new("--output-file"),
                self.requirements_txt.as_os_str(),
                self.requirements_in.as_os_str(),
            ],
        )
        .await
    }

    async fn venv(&self) -> Result<(), TaskError> {
        self.module(
            "pip",
            [
                OsStr::new("install"),
                OsStr::new("-r"),
                self.requirements_txt.as_os_str(),
            ],
        )
        .await
    }

    /// Run `<interpreter> -m <tool> args…` with inherited stdio.
    async fn module<I, S>(&self, tool: &'static str, args: I) -> Result<(), TaskError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        debug!(tool, interpreter = %self.interpreter.display(), "running dev tool");

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-m").arg(tool);
        for arg in args {
            cmd.arg(arg);
        }

        let status = cmd.status().await.map_err(|e| TaskError::Interpreter {
            interpreter: self.interpreter.display().to_string(),
            source: e,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(TaskError::ToolFailed {
                tool,
                code: status.code(),
            })
        }
    }
}
