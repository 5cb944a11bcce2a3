//! Restore command handler.

use wpsnap_core::Location;
use wpsnap_runtime::{RestoreOptions, run_restore};

use crate::commands::RestoreCmd;
use crate::error::CliError;

/// Execute the restore command.
pub async fn execute(cmd: RestoreCmd) -> Result<(), CliError> {
    let options = RestoreOptions {
        snapshot: Location::parse(&cmd.snapshot),
        patch: cmd.patch,
    };

    run_restore(&options).await?;

    Ok(())
}
