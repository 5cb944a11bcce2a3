//! SSH wrapping for commands that run at a remote location.

use std::ffi::OsStr;

use tokio::process::Command;
use wpsnap_core::Location;

use crate::exec::ExecError;

/// A `user@host` pair commands can be wrapped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Remote login user.
    pub user: String,
    /// Remote host name.
    pub host: String,
}

impl SshTarget {
    /// The target of an SSH location, None for local ones.
    pub fn from_location(location: &Location) -> Option<Self> {
        match location {
            Location::Local { .. } => None,
            Location::Ssh { user, host, .. } => Some(Self {
                user: user.clone(),
                host: host.clone(),
            }),
        }
    }

    /// The `user@host` form ssh expects.
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Build `ssh user@host program args…`.
    pub fn command<I, S>(&self, program: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new("ssh");
        cmd.arg(self.target()).arg(program);
        for arg in args {
            cmd.arg(arg);
        }
        cmd
    }
}

/// Build a command running `program args…` at `location`: directly for
/// local locations, wrapped in ssh for remote ones.
pub fn command_at<I, S>(location: &Location, program: &str, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    match SshTarget::from_location(location) {
        Some(ssh) => ssh.command(program, args),
        None => {
            let mut cmd = Command::new(program);
            for arg in args {
                cmd.arg(arg);
            }
            cmd
        }
    }
}

/// Turn an exit-255 failure into the SSH connection error when the
/// command ran against a remote location. ssh reserves 255 for its own
/// failures, so this never misreads a remote tool's exit code.
pub(crate) fn refine(location: &Location, err: ExecError) -> ExecError {
    if let ExecError::Failed {
        code: Some(255), ..
    } = err
    {
        if let Some(target) = location.ssh_target() {
            return ExecError::SshConnection { target };
        }
    }
    err
}
