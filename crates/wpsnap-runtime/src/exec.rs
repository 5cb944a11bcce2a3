//! Helpers for running delegated tools and checking their exit status.
//!
//! Every failure mode here is "the tool exited non-zero" or "the tool
//! could not be launched"; nothing is retried or recovered. The stderr
//! excerpt carried in errors is capped so a chatty tool cannot flood
//! the terminal.

use std::io;
use std::process::{Output, Stdio};

use thiserror::Error;
use tokio::process::Command;

const STDERR_EXCERPT_LIMIT: usize = 1000;

/// Errors from delegated command-line tools.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The tool could not be started at all.
    #[error("could not launch {tool}: {source}")]
    Launch {
        /// Program name as invoked.
        tool: String,
        /// Underlying launch failure.
        #[source]
        source: io::Error,
    },

    /// The tool ran but exited non-zero.
    #[error("{tool} exited unsuccessfully: {stderr}")]
    Failed {
        /// Program name as invoked.
        tool: String,
        /// Exit code, when the process was not killed by a signal.
        code: Option<i32>,
        /// Trimmed excerpt of the tool's stderr.
        stderr: String,
    },

    /// ssh reported exit status 255, its connection-failure marker.
    #[error("SSH connection to {target} could not be established")]
    SshConnection {
        /// The `user@host` pair ssh was asked to reach.
        target: String,
    },
}

pub(crate) fn launch_error(tool: &str, source: io::Error) -> ExecError {
    ExecError::Launch {
        tool: tool.to_string(),
        source,
    }
}

pub(crate) fn failure(tool: &str, output: &Output) -> ExecError {
    ExecError::Failed {
        tool: tool.to_string(),
        code: output.status.code(),
        stderr: stderr_excerpt(&output.stderr),
    }
}

pub(crate) fn check_status(tool: &str, output: &Output) -> Result<(), ExecError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(failure(tool, output))
    }
}

pub(crate) fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() > STDERR_EXCERPT_LIMIT {
        trimmed.chars().take(STDERR_EXCERPT_LIMIT).collect()
    } else {
        trimmed.to_string()
    }
}

/// Run a command to completion with captured output.
pub(crate) async fn run_captured(mut cmd: Command, tool: &str) -> Result<Output, ExecError> {
    cmd.stdin(Stdio::null());
    cmd.output().await.map_err(|e| launch_error(tool, e))
}

/// Run a command, requiring exit status 0.
pub(crate) async fn run_checked(cmd: Command, tool: &str) -> Result<(), ExecError> {
    let output = run_captured(cmd, tool).await?;
    check_status(tool, &output)
}

/// Run `producer | consumer`, requiring both to exit 0.
///
/// The producer's stdout feeds the consumer's stdin directly (no
/// buffering in this process); both stderr streams are captured for
/// error reporting. The producer's status is checked first, matching
/// the direction data flows.
pub(crate) async fn pipeline(
    mut producer: Command,
    producer_name: &str,
    mut consumer: Command,
    consumer_name: &str,
) -> Result<(), ExecError> {
    producer
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut reader = producer
        .spawn()
        .map_err(|e| launch_error(producer_name, e))?;

    let Some(stdout) = reader.stdout.take() else {
        return Err(launch_error(
            producer_name,
            io::Error::other("stdout was not captured"),
        ));
    };
    let stdin: Stdio = stdout
        .try_into()
        .map_err(|e| launch_error(consumer_name, e))?;

    consumer
        .stdin(stdin)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    let writer = consumer
        .spawn()
        .map_err(|e| launch_error(consumer_name, e))?;

    // Both stderr pipes must be drained while the children run; waiting
    // on them one after the other blocks once a pipe buffer fills up.
    let (writer_output, reader_output) =
        tokio::join!(writer.wait_with_output(), reader.wait_with_output());
    let writer_output = writer_output.map_err(|e| launch_error(consumer_name, e))?;
    let reader_output = reader_output.map_err(|e| launch_error(producer_name, e))?;

    check_status(producer_name, &reader_output)?;
    check_status(consumer_name, &writer_output)
}
