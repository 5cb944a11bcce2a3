//! Filesystem operations on locations.
//!
//! Local locations use direct syscalls; remote ones shell out to the
//! matching coreutils over ssh. Archives always travel as a tar stream
//! so a remote destination never needs the payload on local disk twice.

use std::io;
use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use wpsnap_core::{Compression, Location};

use crate::exec::{self, ExecError};
use crate::ssh;

/// Errors from filesystem operations on a location.
#[derive(Debug, Error)]
pub enum FsError {
    /// The file is absent, or unreadable for permission reasons.
    #[error("the file {location} does not exist or you don't have permission to read it")]
    Unreadable {
        /// Textual location form.
        location: String,
    },

    /// A directory could not be created.
    #[error("could not create {location} as a directory: {detail}")]
    CreateDir {
        /// Textual location form.
        location: String,
        /// Underlying failure detail.
        detail: String,
    },

    /// Unexpected local IO failure.
    #[error("IO error on {location}: {source}")]
    Io {
        /// Textual location form.
        location: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A delegated tool failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Read the whole content of the file at `location`.
///
/// Remotely this is a `cat`; exit status 1 is reported as
/// missing-or-unreadable, 255 as an SSH connection failure.
pub async fn read_to_string(location: &Location) -> Result<String, FsError> {
    match location {
        Location::Local { path } => match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
                Err(FsError::Unreadable {
                    location: location.to_string(),
                })
            }
            Err(e) => Err(FsError::Io {
                location: location.to_string(),
                source: e,
            }),
        },
        Location::Ssh { path, .. } => {
            let cmd = ssh::command_at(location, "cat", [path.as_str()]);
            let output = exec::run_captured(cmd, "cat").await?;

            match output.status.code() {
                Some(0) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
                Some(1) => Err(FsError::Unreadable {
                    location: location.to_string(),
                }),
                _ => Err(ssh::refine(location, exec::failure("cat", &output)).into()),
            }
        }
    }
}

/// Ensure the location exists as a directory, parents included.
pub async fn ensure_dir(location: &Location) -> Result<(), FsError> {
    match location {
        Location::Local { path } => {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| FsError::CreateDir {
                    location: location.to_string(),
                    detail: e.to_string(),
                })
        }
        Location::Ssh { path, .. } => {
            let cmd = ssh::command_at(location, "mkdir", ["-p", path.as_str()]);
            exec::run_checked(cmd, "mkdir")
                .await
                .map_err(|e| match ssh::refine(location, e) {
                    ExecError::Failed { stderr, .. } => FsError::CreateDir {
                        location: location.to_string(),
                        detail: stderr,
                    },
                    other => FsError::Exec(other),
                })
        }
    }
}

/// Archive the content of a local directory into `archive`.
///
/// Local destinations are a single tar run; remote ones pipe the tar
/// stream into a remote `dd` so the archive is written in place.
pub async fn archive_dir(
    archive: &Location,
    local_dir: &Path,
    compression: Compression,
) -> Result<(), FsError> {
    debug!(archive = %archive, dir = %local_dir.display(), "archiving directory");

    match archive {
        Location::Local { path } => {
            let mut cmd = Command::new("tar");
            cmd.arg("-C")
                .arg(local_dir)
                .arg("-c")
                .arg(compression.tar_flag())
                .arg("-f")
                .arg(path)
                .arg(".");
            Ok(exec::run_checked(cmd, "tar").await?)
        }
        Location::Ssh { path, .. } => {
            let mut producer = Command::new("tar");
            producer
                .arg("-C")
                .arg(local_dir)
                .arg("-c")
                .arg(compression.tar_flag())
                .arg(".");
            let consumer = ssh::command_at(archive, "dd", [format!("of={path}")]);
            exec::pipeline(producer, "tar", consumer, "dd")
                .await
                .map_err(|e| ssh::refine(archive, e).into())
        }
    }
}

/// Extract the archive at `location` into a local directory.
///
/// The compression flag is inferred from the archive name.
pub async fn extract_archive(location: &Location, dest_dir: &Path) -> Result<(), FsError> {
    let compression = Compression::from_archive_name(location.path());
    debug!(archive = %location, dest = %dest_dir.display(), "extracting archive");

    match location {
        Location::Local { path } => {
            let mut cmd = Command::new("tar");
            cmd.arg("-C")
                .arg(dest_dir)
                .arg("-x")
                .arg(compression.tar_flag())
                .arg("-f")
                .arg(path);
            Ok(exec::run_checked(cmd, "tar").await?)
        }
        Location::Ssh { path, .. } => {
            let producer = ssh::command_at(location, "cat", [path.as_str()]);
            let mut consumer = Command::new("tar");
            consumer
                .arg("-C")
                .arg(dest_dir)
                .arg("-x")
                .arg(compression.tar_flag());
            exec::pipeline(producer, "cat", consumer, "tar")
                .await
                .map_err(|e| ssh::refine(location, e).into())
        }
    }
}

/// Recursively change the owner of the location's tree.
pub async fn chown(location: &Location, owner: &str) -> Result<(), FsError> {
    let cmd = ssh::command_at(location, "chown", ["-R", owner, location.path()]);
    exec::run_checked(cmd, "chown")
        .await
        .map_err(|e| ssh::refine(location, e).into())
}

/// Materialize a git repository at the location, checked out at
/// `version`. Whatever was at the path before is replaced.
pub async fn git_checkout(location: &Location, repo: &str, version: &str) -> Result<(), FsError> {
    match location {
        Location::Local { path } => match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(FsError::Io {
                    location: location.to_string(),
                    source: e,
                });
            }
        },
        Location::Ssh { path, .. } => {
            let cmd = ssh::command_at(location, "rm", ["-rf", path.as_str()]);
            exec::run_checked(cmd, "rm")
                .await
                .map_err(|e| ssh::refine(location, e))?;
        }
    }

    let clone = ssh::command_at(location, "git", ["clone", repo, location.path()]);
    exec::run_checked(clone, "git clone")
        .await
        .map_err(|e| ssh::refine(location, e))?;

    let checkout = ssh::command_at(
        location,
        "git",
        ["-C", location.path(), "checkout", version],
    );
    exec::run_checked(checkout, "git checkout")
        .await
        .map_err(|e| ssh::refine(location, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_local_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("wp-config.php");
        std::fs::write(&file, "<?php // config").unwrap();

        let loc = Location::parse(file.to_str().unwrap());
        let content = read_to_string(&loc).await.unwrap();
        assert_eq!(content, "<?php // config");
    }

    #[tokio::test]
    async fn missing_local_file_is_unreadable() {
        let loc = Location::parse("/nonexistent/wpsnap/wp-config.php");
        let err = read_to_string(&loc).await.unwrap_err();
        assert!(matches!(err, FsError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn ensure_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let loc = Location::parse(nested.to_str().unwrap());

        ensure_dir(&loc).await.unwrap();
        assert!(nested.is_dir());

        // Idempotent
        ensure_dir(&loc).await.unwrap();
    }

    #[tokio::test]
    async fn archive_and_extract_round_trip() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.php"), "<?php").unwrap();
        std::fs::create_dir(src.path().join("wp-content")).unwrap();
        std::fs::write(src.path().join("wp-content/style.css"), "body {}").unwrap();

        let store = tempfile::tempdir().unwrap();
        let archive_path = store.path().join("snap.tar.gz");
        let archive = Location::parse(archive_path.to_str().unwrap());

        archive_dir(&archive, src.path(), Compression::Gzip)
            .await
            .unwrap();
        assert!(archive_path.is_file());

        let out = tempfile::tempdir().unwrap();
        extract_archive(&archive, out.path()).await.unwrap();
        assert!(out.path().join("index.php").is_file());
        assert_eq!(
            std::fs::read_to_string(out.path().join("wp-content/style.css")).unwrap(),
            "body {}"
        );
    }
}
