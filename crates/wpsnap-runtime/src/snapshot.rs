//! The snapshot pipeline.
//!
//! A snapshot is a tar archive holding `settings.json` (how it was
//! taken and the parsed wp-config), `dump.sql` and the `wordpress/`
//! file tree. Everything is staged in a temporary directory and
//! archived to the backup location in one final step, so a failed run
//! never leaves a half-written snapshot behind.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use wpsnap_core::{
    Compression, Location, SettingsError, SnapshotArgs, SnapshotSettings, WpConfigError,
    parse_wp_config, render_file_name,
};

use crate::db::{DbError, DbServer};
use crate::fsops::{self, FsError};
use crate::sync::{self, SyncError};

/// Everything a snapshot run needs to know.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// WordPress root, local or `user@host:path`.
    pub source: Location,
    /// Directory the archive is written to.
    pub backup_dir: Location,
    /// Base name override for the archive; defaults to the DB name.
    pub base_name: Option<String>,
    /// Archive file-name template, `{base}` and `{time}` placeholders.
    pub file_name_template: String,
    /// Archive compression mode.
    pub compression: Compression,
    /// Database host override.
    pub db_host: Option<String>,
    /// Hold wp-cli maintenance mode while copying.
    pub maintenance_mode: bool,
    /// tar `--exclude` patterns for the file copy.
    pub exclude: Vec<String>,
    /// tar `--exclude-tag-all` marker files for the file copy.
    pub exclude_tag_all: Vec<String>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            source: Location::parse("."),
            backup_dir: Location::parse("."),
            base_name: None,
            file_name_template: "{base}_{time}.tar.gz".to_string(),
            compression: Compression::Gzip,
            db_host: None,
            maintenance_mode: false,
            exclude: Vec::new(),
            exclude_tag_all: Vec::new(),
        }
    }
}

/// Errors from the snapshot pipeline.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// wp-config.php could not be read or parsed.
    #[error(transparent)]
    WpConfig(#[from] WpConfigError),

    /// A location operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// A file transfer failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The database dump failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Settings could not be serialized.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The staging directory could not be used.
    #[error("could not use staging directory: {0}")]
    Staging(#[from] std::io::Error),
}

/// Take a snapshot and return the location of the written archive.
pub async fn take_snapshot(options: &SnapshotOptions) -> Result<Location, SnapshotError> {
    let now = Utc::now();
    let template = options
        .compression
        .rewrite_template(&options.file_name_template);

    info!("Parsing remote configuration");
    let raw = fsops::read_to_string(&options.source.child("wp-config.php")).await?;
    let wp_config = parse_wp_config(&raw)?;

    let staging = tempfile::tempdir()?;

    info!("Saving settings");
    let settings = SnapshotSettings {
        args: SnapshotArgs {
            source: options.source.to_string(),
            backup_dir: options.backup_dir.to_string(),
            snapshot_base_name: options.base_name.clone(),
            file_name_template: template.clone(),
            compression_mode: options.compression,
            db_host: options.db_host.clone(),
            maintenance_mode: options.maintenance_mode,
            exclude: options.exclude.clone(),
            exclude_tag_all: options.exclude_tag_all.clone(),
        },
        wp_config: wp_config.clone(),
        time: now,
    };
    tokio::fs::write(
        staging.path().join("settings.json"),
        settings.to_json_pretty()?,
    )
    .await?;

    if options.maintenance_mode {
        info!("Activating maintenance mode");
        sync::set_maintenance_mode(&options.source, true).await?;
    }

    let copied = copy_payload(options, &wp_config, staging.path()).await;

    if options.maintenance_mode {
        info!("Deactivating maintenance mode");
        if let Err(e) = sync::set_maintenance_mode(&options.source, false).await {
            // Keep the copy error if there was one; otherwise this is
            // the failure the user needs to hear about.
            if copied.is_ok() {
                return Err(e.into());
            }
            warn!("could not deactivate maintenance mode: {e}");
        }
    }
    copied?;

    info!("Writing archive");
    fsops::ensure_dir(&options.backup_dir).await?;
    let name = render_file_name(&template, settings.archive_base_name(), &now);
    let archive = options.backup_dir.child(&name);
    fsops::archive_dir(&archive, staging.path(), options.compression).await?;
    info!("Wrote archive {archive}");

    Ok(archive)
}

async fn copy_payload(
    options: &SnapshotOptions,
    wp_config: &wpsnap_core::WpConfig,
    staging: &std::path::Path,
) -> Result<(), SnapshotError> {
    info!("Copying database");
    let db = DbServer::from_wp_config(wp_config, &options.source, options.db_host.as_deref());
    db.dump_to_file(&staging.join("dump.sql")).await?;

    info!("Copying files");
    let dest = Location::parse(&staging.join("wordpress").display().to_string());
    sync::copy_files(&options.source, &dest, &options.exclude, &options.exclude_tag_all).await?;

    Ok(())
}
