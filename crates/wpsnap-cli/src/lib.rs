//! CLI adapter for wpsnap.
//!
//! Argument parsing and dispatch only; the pipelines themselves live
//! in `wpsnap-runtime`.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use commands::{BackupDbCmd, Commands, DevCmd, DevCommand, RestoreCmd, SnapshotCmd};
pub use error::CliError;
pub use parser::Cli;

/// Route a parsed invocation to its handler.
pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Snapshot(cmd) => handlers::snapshot::execute(cmd).await,
        Commands::Restore(cmd) => handlers::restore::execute(cmd).await,
        Commands::BackupDb(cmd) => handlers::backup_db::execute(cmd).await,
        Commands::Dev(cmd) => handlers::dev::execute(cmd).await,
    }
}
