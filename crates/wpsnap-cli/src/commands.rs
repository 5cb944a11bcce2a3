//! Subcommand definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use wpsnap_core::Compression;
use wpsnap_runtime::DevTarget;

/// All wpsnap subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Take a snapshot of a WordPress website and store it locally or
    /// remotely. Requires rsync, tar and mysqldump.
    Snapshot(SnapshotCmd),

    /// Restore a snapshot onto the source it was taken from
    Restore(RestoreCmd),

    /// Dump only the database, without the file tree
    BackupDb(BackupDbCmd),

    /// Developer-workflow targets (formatting, requirements pinning)
    Dev(DevCmd),
}

/// Arguments of the snapshot subcommand.
#[derive(Args)]
pub struct SnapshotCmd {
    /// WordPress root. Syntax: `/var/www` or `user@host:/var/www`
    pub source: String,

    /// Directory to store the snapshot
    pub backup_dir: String,

    /// Base name for the snapshot file. Defaults to the DB name
    #[arg(short = 'n', long)]
    pub snapshot_base_name: Option<String>,

    /// Template for the snapshot file name
    #[arg(short = 't', long, default_value = "{base}_{time}.tar.gz")]
    pub file_name_template: String,

    /// Compression mode for tar (gzip, bzip2, lzip, xz)
    #[arg(short = 'c', long, default_value = "gzip")]
    pub compression_mode: Compression,

    /// Database server address, when the wp-config value is only
    /// reachable from the web server itself
    #[arg(long)]
    pub db_host: Option<String>,

    /// Hold maintenance mode while copying to prevent conflicting
    /// file changes
    #[arg(long)]
    pub maintenance_mode: bool,

    /// Exclude source files/directories, given as a tar PATTERN
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Exclude directories containing FILE and all their content
    #[arg(long, value_name = "FILE")]
    pub exclude_tag_all: Vec<String>,
}

/// Arguments of the restore subcommand.
#[derive(Args)]
pub struct RestoreCmd {
    /// A settings patch file
    #[arg(short = 'p', long)]
    pub patch: Option<PathBuf>,

    /// Location of the snapshot file. Syntax: `~/snap.tar.gz` or
    /// `user@host:snap.tar.gz`
    pub snapshot: String,
}

/// Arguments of the backup-db subcommand.
#[derive(Args)]
pub struct BackupDbCmd {
    /// Directory holding the settings file. Syntax: `/var/www` or
    /// `user@host:/var/www`
    pub source: String,

    /// Directory to store the dump (local)
    pub backup_dir: String,

    /// Name of the settings file under the source directory
    #[arg(short = 'p', long, default_value = "settings.json")]
    pub settings: String,

    /// Base name for the dump file. Defaults to the DB name
    #[arg(short = 'n', long)]
    pub snapshot_base_name: Option<String>,

    /// Template for the dump file name
    #[arg(short = 't', long, default_value = "{base}_dump_{time}.sql")]
    pub file_name_template: String,

    /// Compression mode for the file-name suffix
    #[arg(short = 'c', long, default_value = "gzip")]
    pub compression_mode: Compression,

    /// Database server address override
    #[arg(long)]
    pub db_host: Option<String>,
}

/// Arguments of the dev subcommand.
#[derive(Args)]
pub struct DevCmd {
    /// Directory holding the Python sources
    #[arg(long, default_value = "src")]
    pub src_dir: PathBuf,

    /// Loose dependency specification to compile from
    #[arg(long, default_value = "requirements.in")]
    pub requirements_in: PathBuf,

    /// Pinned requirements file to write and install from
    #[arg(long, default_value = "requirements.txt")]
    pub output: PathBuf,

    #[command(subcommand)]
    pub target: DevCommand,
}

/// The developer-workflow targets.
#[derive(Subcommand, Clone, Copy)]
pub enum DevCommand {
    /// Run isort then black over the sources
    Format,
    /// Reorder imports recursively
    Isort,
    /// Format the sources in place
    Black,
    /// Install the pinned requirements after regenerating them
    Venv,
    /// Regenerate the pinned requirements file
    Requirements,
}

impl From<DevCommand> for DevTarget {
    fn from(command: DevCommand) -> Self {
        match command {
            DevCommand::Format => Self::Format,
            DevCommand::Isort => Self::Isort,
            DevCommand::Black => Self::Black,
            DevCommand::Venv => Self::Venv,
            DevCommand::Requirements => Self::Requirements,
        }
    }
}
