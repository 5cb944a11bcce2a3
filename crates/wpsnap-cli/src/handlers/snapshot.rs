//! Snapshot command handler.

use wpsnap_core::Location;
use wpsnap_runtime::{SnapshotOptions, take_snapshot};

use crate::commands::SnapshotCmd;
use crate::error::CliError;

/// Execute the snapshot command and print the archive location.
pub async fn execute(cmd: SnapshotCmd) -> Result<(), CliError> {
    let options = SnapshotOptions {
        source: Location::parse(&cmd.source),
        backup_dir: Location::parse(&cmd.backup_dir),
        base_name: cmd.snapshot_base_name,
        file_name_template: cmd.file_name_template,
        compression: cmd.compression_mode,
        db_host: cmd.db_host,
        maintenance_mode: cmd.maintenance_mode,
        exclude: cmd.exclude,
        exclude_tag_all: cmd.exclude_tag_all,
    };

    let archive = take_snapshot(&options).await?;
    println!("{archive}");

    Ok(())
}
