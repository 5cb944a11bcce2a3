//! The restore pipeline.
//!
//! Restoring replays a snapshot against the source recorded in its
//! `settings.json`: files through rsync with delete, then the database
//! dump, then whatever the patch file asked for on top (git checkouts,
//! ownership, dump rewrites, setup queries).

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use wpsnap_core::{Location, ReplaceMap, RestoreConfig, SettingsError, SnapshotSettings};

use crate::db::{self, DbError, DbServer};
use crate::fsops::{self, FsError};
use crate::sync::{self, SyncError};

/// Everything a restore run needs to know.
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Location of the snapshot archive.
    pub snapshot: Location,
    /// Optional JSON patch file altering the restoration.
    pub patch: Option<PathBuf>,
}

/// Errors from the restore pipeline.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// The archive could not be fetched or extracted.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The snapshot carries no readable settings.json.
    #[error("snapshot has no readable settings.json: {0}")]
    MissingSettings(std::io::Error),

    /// settings.json or the patch file is not valid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The patch file could not be opened.
    #[error("could not open patch file: {0}")]
    PatchIo(std::io::Error),

    /// A file transfer failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A database step failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The staging directory could not be used.
    #[error("could not use staging directory: {0}")]
    Staging(#[from] std::io::Error),
}

/// Restore a snapshot onto the source it was taken from.
pub async fn run_restore(options: &RestoreOptions) -> Result<(), RestoreError> {
    let staging = tempfile::tempdir()?;

    info!("Extracting archive");
    fsops::extract_archive(&options.snapshot, staging.path()).await?;

    info!("Reading configuration");
    let raw = tokio::fs::read_to_string(staging.path().join("settings.json"))
        .await
        .map_err(RestoreError::MissingSettings)?;
    let mut config = RestoreConfig::from_settings(SnapshotSettings::from_json(&raw)?);
    if let Some(patch) = &options.patch {
        let patch_raw = tokio::fs::read_to_string(patch)
            .await
            .map_err(RestoreError::PatchIo)?;
        config.apply_patch(&patch_raw)?;
    }

    let remote = Location::parse(&config.settings.args.source);

    info!("Restoring files");
    let local_tree = Location::parse(&staging.path().join("wordpress").display().to_string());
    sync::sync_files(&local_tree, &remote, true).await?;

    if !config.git.is_empty() {
        info!("Cloning Git repos");
        for checkout in &config.git {
            let target = remote.child(&checkout.location);
            fsops::git_checkout(&target, &checkout.repo, &checkout.version).await?;
            info!(
                "Cloned {}@{} to {}",
                checkout.repo, checkout.version, target
            );
        }
    }

    if let Some(owner) = &config.owner {
        info!("Changing files owner");
        fsops::chown(&remote, owner).await?;
    }

    info!("Restoring DB");
    let database = DbServer::from_wp_config(
        &config.settings.wp_config,
        &remote,
        config.settings.args.db_host.as_deref(),
    );
    let mut dump = staging.path().join("dump.sql");
    if !config.replace.is_empty() {
        info!("Rewriting dump");
        let patched = staging.path().join("dump.patched.sql");
        db::patch_sql_dump(&dump, &patched, &ReplaceMap::from(config.replace.as_slice()))?;
        dump = patched;
    }
    database.restore_dump(&dump).await?;

    if !config.setup_queries.is_empty() {
        info!("Running setup queries");
        for query in &config.setup_queries {
            database.run_query(query).await?;
        }
    }

    Ok(())
}
