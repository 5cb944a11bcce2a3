//! File transfer between locations and maintenance-mode toggling.

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use wpsnap_core::Location;

use crate::exec::{self, ExecError};
use crate::fsops::{self, FsError};
use crate::ssh;

/// Exclude patterns rsync always applies.
const RSYNC_EXCLUDES: [&str; 4] = [".git", ".idea", "*.swp", "*.un~"];

/// Errors from file transfers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The destination directory could not be prepared.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// A transfer tool failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Copy a tree from `src` to `dest` through a tar pipeline.
///
/// The producer tars the source in place (ssh-wrapped when remote) and
/// the consumer untars at the destination, so the data crosses at most
/// one network hop and never lands in an intermediate file.
pub async fn copy_files(
    src: &Location,
    dest: &Location,
    excludes: &[String],
    exclude_tag_alls: &[String],
) -> Result<(), SyncError> {
    debug!(%src, %dest, "copying files through tar pipeline");

    fsops::ensure_dir(dest).await?;

    let mut producer_args: Vec<String> = vec!["-C".to_string(), src.path().to_string()];
    for pattern in excludes {
        producer_args.push("--exclude".to_string());
        producer_args.push(pattern.clone());
    }
    for marker in exclude_tag_alls {
        producer_args.push("--exclude-tag-all".to_string());
        producer_args.push(marker.clone());
    }
    producer_args.push("-c".to_string());
    producer_args.push(".".to_string());

    let producer = ssh::command_at(src, "tar", &producer_args);
    let consumer = ssh::command_at(dest, "tar", ["-C", dest.path(), "-x"]);

    exec::pipeline(producer, "tar (read)", consumer, "tar (write)")
        .await
        .map_err(|e| {
            // A 255 can come from either end; blame the remote one.
            let refined = ssh::refine(src, e);
            ssh::refine(dest, refined).into()
        })
}

/// Copy a tree from `src` to `dest` with rsync.
///
/// Used on restore, where `delete` removes files that are absent from
/// the snapshot. rsync handles remote endpoints natively, so the
/// command always runs locally.
pub async fn sync_files(src: &Location, dest: &Location, delete: bool) -> Result<(), SyncError> {
    debug!(%src, %dest, delete, "syncing files with rsync");

    fsops::ensure_dir(dest).await?;

    let mut cmd = Command::new("rsync");
    cmd.arg("-rz");
    for pattern in RSYNC_EXCLUDES {
        cmd.arg(format!("--exclude={pattern}"));
    }
    if delete {
        cmd.arg("--delete");
    }
    cmd.arg(src.rsync_path(true)).arg(dest.rsync_path(true));

    Ok(exec::run_checked(cmd, "rsync").await?)
}

/// Toggle wp-cli maintenance mode at the WordPress root.
pub async fn set_maintenance_mode(source: &Location, active: bool) -> Result<(), SyncError> {
    let action = if active { "activate" } else { "deactivate" };
    let cmd = ssh::command_at(
        source,
        "wp",
        [
            "maintenance-mode",
            action,
            &format!("--path={}", source.path()),
            "--quiet",
        ],
    );

    exec::run_checked(cmd, "wp")
        .await
        .map_err(|e| ssh::refine(source, e).into())
}
