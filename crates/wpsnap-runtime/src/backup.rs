//! Database-only backups.
//!
//! A lighter cousin of the full snapshot: no file copy, no archive,
//! just a mysqldump into the backup directory, named like snapshot
//! archives are.

use std::path::Path;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use wpsnap_core::{Compression, Location, SettingsError, SnapshotSettings, render_file_name};

use crate::db::{DbError, DbServer};
use crate::fsops::{self, FsError};

/// Everything a database backup run needs to know.
#[derive(Debug, Clone)]
pub struct BackupDbOptions {
    /// Directory holding the settings file with the DB credentials.
    pub source: Location,
    /// Directory the dump is written to. Must be local.
    pub backup_dir: Location,
    /// Name of the settings file under the source directory.
    pub settings_name: String,
    /// Base name override for the dump; defaults to the DB name.
    pub base_name: Option<String>,
    /// Dump file-name template.
    pub file_name_template: String,
    /// Compression mode, used only to rewrite the template suffix.
    pub compression: Compression,
    /// Database host override.
    pub db_host: Option<String>,
}

impl Default for BackupDbOptions {
    fn default() -> Self {
        Self {
            source: Location::parse("."),
            backup_dir: Location::parse("."),
            settings_name: "settings.json".to_string(),
            base_name: None,
            file_name_template: "{base}_dump_{time}.sql".to_string(),
            compression: Compression::Gzip,
            db_host: None,
        }
    }
}

/// Errors from the database backup pipeline.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The settings file could not be read.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The settings file is not valid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The dump is written locally; a remote backup dir is not supported.
    #[error("backup directory {0} must be local for database backups")]
    RemoteBackupDir(String),

    /// The dump itself failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Dump the database described by the source's settings file and
/// return the location of the written dump.
pub async fn backup_database(options: &BackupDbOptions) -> Result<Location, BackupError> {
    let now = Utc::now();

    if options.backup_dir.is_remote() {
        return Err(BackupError::RemoteBackupDir(options.backup_dir.to_string()));
    }

    info!("Reading configuration");
    let raw = fsops::read_to_string(&options.source.child(&options.settings_name)).await?;
    let settings = SnapshotSettings::from_json(&raw)?;

    info!("Dumping database");
    fsops::ensure_dir(&options.backup_dir).await?;
    let template = options
        .compression
        .rewrite_template(&options.file_name_template);
    let base = options
        .base_name
        .as_deref()
        .unwrap_or(&settings.wp_config.db_name);
    let target = options
        .backup_dir
        .child(&render_file_name(&template, base, &now));

    let database = DbServer::from_wp_config(
        &settings.wp_config,
        &options.source,
        options.db_host.as_deref(),
    );
    database.dump_to_file(Path::new(target.path())).await?;
    info!("Wrote dump {target}");

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remote_backup_dir_is_rejected() {
        let options = BackupDbOptions {
            backup_dir: Location::parse("deploy@host:/srv/backups"),
            ..BackupDbOptions::default()
        };
        let err = backup_database(&options).await.unwrap_err();
        assert!(matches!(err, BackupError::RemoteBackupDir(_)));
    }

    #[tokio::test]
    async fn missing_settings_file_is_reported() {
        let src = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        let options = BackupDbOptions {
            source: Location::parse(src.path().to_str().unwrap()),
            backup_dir: Location::parse(backups.path().to_str().unwrap()),
            ..BackupDbOptions::default()
        };
        let err = backup_database(&options).await.unwrap_err();
        assert!(matches!(err, BackupError::Fs(FsError::Unreadable { .. })));
    }
}
