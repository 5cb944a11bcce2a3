//! CLI-specific error type and exit-code mapping.
//!
//! Managed errors carry a message written for the user and exit with
//! code 1. Anything unexpected exits with 2. clap reports usage errors
//! with its own code 2 before dispatch ever runs.

use thiserror::Error;
use wpsnap_runtime::{BackupError, RestoreError, SnapshotError, TaskError};

/// CLI-level error.
#[derive(Debug, Error)]
pub enum CliError {
    /// A known failure mode with an explicative message.
    #[error("{0}")]
    Managed(String),

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl CliError {
    /// Exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Managed(_) => 1,
            Self::Unexpected(_) => 2,
        }
    }
}

impl From<SnapshotError> for CliError {
    fn from(err: SnapshotError) -> Self {
        Self::Managed(err.to_string())
    }
}

impl From<RestoreError> for CliError {
    fn from(err: RestoreError) -> Self {
        Self::Managed(err.to_string())
    }
}

impl From<BackupError> for CliError {
    fn from(err: BackupError) -> Self {
        Self::Managed(err.to_string())
    }
}

impl From<TaskError> for CliError {
    fn from(err: TaskError) -> Self {
        Self::Managed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_errors_exit_one() {
        let err = CliError::from(TaskError::ToolFailed {
            tool: "black",
            code: Some(123),
        });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn unexpected_errors_exit_two() {
        let err = CliError::Unexpected(anyhow::anyhow!("boom"));
        assert_eq!(err.exit_code(), 2);
    }
}
