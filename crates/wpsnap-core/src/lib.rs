//! Core domain types for wpsnap.
//!
//! This crate holds the pure data model: locations, compression modes,
//! the parsed WordPress configuration, snapshot settings and restore
//! configuration, and the serialized-aware replacement walker. Nothing
//! in here spawns a process or opens a file; that all lives in
//! `wpsnap-runtime`.

pub mod compression;
pub mod location;
pub mod serialized;
pub mod settings;
pub mod wp_config;

// Re-export commonly used types for convenience
pub use compression::Compression;
pub use location::Location;
pub use serialized::{ReplaceMap, walk};
pub use settings::{
    GitCheckout, ReplaceRule, RestoreConfig, SettingsError, SnapshotArgs, SnapshotSettings,
    render_file_name,
};
pub use wp_config::{WpConfig, WpConfigError, parse_wp_config};
