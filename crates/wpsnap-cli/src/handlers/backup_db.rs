//! Database backup command handler.

use wpsnap_core::Location;
use wpsnap_runtime::{BackupDbOptions, backup_database};

use crate::commands::BackupDbCmd;
use crate::error::CliError;

/// Execute the backup-db command and print the dump location.
pub async fn execute(cmd: BackupDbCmd) -> Result<(), CliError> {
    let options = BackupDbOptions {
        source: Location::parse(&cmd.source),
        backup_dir: Location::parse(&cmd.backup_dir),
        settings_name: cmd.settings,
        base_name: cmd.snapshot_base_name,
        file_name_template: cmd.file_name_template,
        compression: cmd.compression_mode,
        db_host: cmd.db_host,
    };

    let dump = backup_database(&options).await?;
    println!("{dump}");

    Ok(())
}
