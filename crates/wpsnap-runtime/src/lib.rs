//! Process-spawning layer of wpsnap.
//!
//! All real work in wpsnap happens inside delegated command-line tools:
//! ssh, tar, rsync, mysqldump, mysql, wp, git, chown and the Python
//! interpreter for the dev targets. This crate builds those
//! invocations, wires their pipes together and maps their exit statuses
//! to errors. The snapshot, restore and backup-db pipelines live here
//! too, since they are little more than an ordering of such
//! invocations.

pub mod backup;
pub mod db;
pub mod exec;
pub mod fsops;
pub mod restore;
pub mod snapshot;
pub mod ssh;
pub mod sync;
pub mod tasks;

// Re-export the entry points the CLI dispatches to
pub use backup::{BackupDbOptions, BackupError, backup_database};
pub use db::{DbError, DbServer, patch_sql_dump};
pub use exec::ExecError;
pub use fsops::FsError;
pub use restore::{RestoreError, RestoreOptions, run_restore};
pub use snapshot::{SnapshotError, SnapshotOptions, take_snapshot};
pub use ssh::SshTarget;
pub use sync::SyncError;
pub use tasks::{DevTarget, TaskError, TaskRunner};
