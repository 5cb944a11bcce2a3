//! Extraction of database settings from `wp-config.php`.
//!
//! The snapshot pipeline fetches the raw file through the location
//! layer and reads the `define()` calls with regexes rather than
//! evaluating PHP. This covers every stock wp-config.php and the usual
//! hand-edited variants; exotic configs that compute their credentials
//! at runtime are not supported.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database settings of a WordPress installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpConfig {
    /// MySQL host, as configured (`DB_HOST`).
    pub db_host: String,
    /// MySQL user (`DB_USER`).
    pub db_user: String,
    /// MySQL password (`DB_PASSWORD`).
    pub db_password: String,
    /// Database name (`DB_NAME`).
    pub db_name: String,
    /// Table prefix (`$table_prefix`), when declared.
    #[serde(default)]
    pub table_prefix: Option<String>,
}

/// Errors reading a wp-config.php.
#[derive(Debug, Error)]
pub enum WpConfigError {
    /// A required `define()` is missing or not a plain string literal.
    #[error("could not find {key} in wp-config.php")]
    MissingKey {
        /// The constant that was not found.
        key: &'static str,
    },
}

/// Parse the content of a `wp-config.php` file.
pub fn parse_wp_config(source: &str) -> Result<WpConfig, WpConfigError> {
    Ok(WpConfig {
        db_host: find_define(source, "DB_HOST")?,
        db_user: find_define(source, "DB_USER")?,
        db_password: find_define(source, "DB_PASSWORD")?,
        db_name: find_define(source, "DB_NAME")?,
        table_prefix: find_table_prefix(source),
    })
}

fn find_define(source: &str, key: &'static str) -> Result<String, WpConfigError> {
    let pattern = format!(
        r#"define\(\s*['"]{key}['"]\s*,\s*['"]([^'"]*)['"]\s*\)"#
    );
    let re = Regex::new(&pattern).expect("define regex is valid");

    re.captures(source)
        .map(|caps| caps[1].to_string())
        .ok_or(WpConfigError::MissingKey { key })
}

fn find_table_prefix(source: &str) -> Option<String> {
    let re = Regex::new(r#"\$table_prefix\s*=\s*['"]([^'"]*)['"]"#)
        .expect("table prefix regex is valid");
    re.captures(source).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCK_CONFIG: &str = r#"<?php
define( 'DB_NAME', 'wordpress' );
define( 'DB_USER', 'wp_user' );
define( 'DB_PASSWORD', 's3cret' );
define( 'DB_HOST', 'localhost' );
define( 'DB_CHARSET', 'utf8' );
$table_prefix = 'wp_';
"#;

    #[test]
    fn parses_stock_config() {
        let config = parse_wp_config(STOCK_CONFIG).unwrap();
        assert_eq!(config.db_name, "wordpress");
        assert_eq!(config.db_user, "wp_user");
        assert_eq!(config.db_password, "s3cret");
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.table_prefix.as_deref(), Some("wp_"));
    }

    #[test]
    fn parses_double_quoted_defines_without_spaces() {
        let source = r#"define("DB_NAME","site");define("DB_USER","u");
define("DB_PASSWORD","p");define("DB_HOST","127.0.0.1:3306");"#;
        let config = parse_wp_config(source).unwrap();
        assert_eq!(config.db_name, "site");
        assert_eq!(config.db_host, "127.0.0.1:3306");
        assert_eq!(config.table_prefix, None);
    }

    #[test]
    fn missing_define_names_the_key() {
        let err = parse_wp_config("<?php // empty").unwrap_err();
        assert!(err.to_string().contains("DB_HOST"));
    }
}
