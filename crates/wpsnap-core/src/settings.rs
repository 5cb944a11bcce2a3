//! Snapshot settings and restore configuration.
//!
//! Every snapshot embeds a `settings.json` describing the arguments it
//! was taken with, the parsed WordPress configuration and the capture
//! time. Restoring reads that file back and optionally overlays a patch
//! file which can change ownership, clone git repositories, rewrite
//! dump content or run setup queries after the database import.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compression::Compression;
use crate::wp_config::WpConfig;

/// Arguments a snapshot was taken with, as recorded in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotArgs {
    /// WordPress root, textual location form.
    pub source: String,
    /// Directory the archive was written to, textual location form.
    pub backup_dir: String,
    /// Base name override for the archive; defaults to the DB name.
    #[serde(default)]
    pub snapshot_base_name: Option<String>,
    /// Archive file-name template.
    #[serde(default = "default_file_name_template")]
    pub file_name_template: String,
    /// Compression mode of the archive.
    #[serde(default)]
    pub compression_mode: Compression,
    /// Database host override used instead of the wp-config value.
    #[serde(default)]
    pub db_host: Option<String>,
    /// Whether maintenance mode was held during the copy.
    #[serde(default)]
    pub maintenance_mode: bool,
    /// tar `--exclude` patterns applied to the file copy.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// tar `--exclude-tag-all` marker files applied to the file copy.
    #[serde(default)]
    pub exclude_tag_all: Vec<String>,
}

fn default_file_name_template() -> String {
    "{base}_{time}.tar.gz".to_string()
}

/// The content of a snapshot's `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Arguments of the snapshot run.
    pub args: SnapshotArgs,
    /// Parsed WordPress configuration at capture time.
    pub wp_config: WpConfig,
    /// Capture time, UTC.
    pub time: DateTime<Utc>,
}

impl SnapshotSettings {
    /// Base name for the archive: the explicit override or the DB name.
    pub fn archive_base_name(&self) -> &str {
        self.args
            .snapshot_base_name
            .as_deref()
            .unwrap_or(&self.wp_config.db_name)
    }

    /// Serialize to the pretty JSON form stored inside the archive.
    pub fn to_json_pretty(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a `settings.json` read back from a snapshot.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Render an archive file name from its template.
///
/// `{base}` and `{time}` are the only placeholders; the timestamp is
/// RFC 3339 with microseconds and a `Z` suffix.
pub fn render_file_name(template: &str, base: &str, time: &DateTime<Utc>) -> String {
    template
        .replace("{base}", base)
        .replace("{time}", &time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A git repository to materialize inside the restored tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCheckout {
    /// Path relative to the WordPress root.
    pub location: String,
    /// Clone URL.
    pub repo: String,
    /// Branch, tag or commit to check out.
    pub version: String,
}

/// A plain-text replacement applied to the SQL dump before import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    /// Text to search for.
    pub search: String,
    /// Replacement text.
    pub replace: String,
}

/// Optional overrides a restore patch file may carry.
///
/// Only keys present in the patch override the defaults, matching the
/// behavior of a JSON object merge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestorePatch {
    /// `chown`-style owner for the restored files. An explicit `null`
    /// clears an inherited owner, a missing key leaves it untouched.
    #[serde(default, deserialize_with = "present_value")]
    pub owner: Option<Option<String>>,
    /// Repositories to clone into the restored tree.
    pub git: Option<Vec<GitCheckout>>,
    /// SQL statements run after the database import.
    pub setup_queries: Option<Vec<String>>,
    /// Dump rewrites applied before the database import.
    pub replace: Option<Vec<ReplaceRule>>,
}

// Wraps a present value in Some so a key set to null is told apart
// from a key that is missing entirely.
fn present_value<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Effective restore configuration: snapshot settings plus patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreConfig {
    /// Settings read from the snapshot.
    pub settings: SnapshotSettings,
    /// Owner for restored files, when configured.
    pub owner: Option<String>,
    /// Repositories to clone into the restored tree.
    pub git: Vec<GitCheckout>,
    /// SQL statements run after the database import.
    pub setup_queries: Vec<String>,
    /// Dump rewrites applied before the database import.
    pub replace: Vec<ReplaceRule>,
}

impl RestoreConfig {
    /// Configuration with no patch applied.
    pub fn from_settings(settings: SnapshotSettings) -> Self {
        Self {
            settings,
            owner: None,
            git: Vec::new(),
            setup_queries: Vec::new(),
            replace: Vec::new(),
        }
    }

    /// Overlay a patch file's content onto this configuration.
    pub fn apply_patch(&mut self, patch_json: &str) -> Result<(), SettingsError> {
        let patch: RestorePatch = serde_json::from_str(patch_json)?;

        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if let Some(git) = patch.git {
            self.git = git;
        }
        if let Some(queries) = patch.setup_queries {
            self.setup_queries = queries;
        }
        if let Some(replace) = patch.replace {
            self.replace = replace;
        }

        Ok(())
    }
}

/// Errors reading or writing settings files.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file is not valid JSON or misses required fields.
    #[error("invalid settings content: {0}")]
    Json(#[from] serde_json::Error),
}
