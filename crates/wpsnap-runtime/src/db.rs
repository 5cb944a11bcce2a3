//! MySQL access, locally or through an SSH hop.
//!
//! The database is never spoken to directly: dumps and imports go
//! through the mysqldump/mysql client binaries found at the source
//! location, mirroring how the files themselves are handled.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use wpsnap_core::{Location, ReplaceMap, WpConfig, walk};

use crate::exec::{self, ExecError};
use crate::ssh::SshTarget;

/// Errors talking to MySQL.
#[derive(Debug, Error)]
pub enum DbError {
    /// mysqldump failed.
    #[error("could not dump MySQL DB: {0}")]
    Dump(String),

    /// mysql failed while importing a dump.
    #[error("could not import MySQL DB: {0}")]
    Import(String),

    /// mysql failed while running a query.
    #[error("could not run MySQL query: {0}")]
    Query(String),

    /// A dump file could not be opened or written.
    #[error("could not open SQL dump: {0}")]
    DumpIo(#[from] std::io::Error),

    /// The client binary could not be launched, or ssh failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// A handle on the database of a WordPress installation.
#[derive(Debug, Clone)]
pub struct DbServer {
    host: String,
    user: String,
    password: String,
    db_name: String,
    ssh: Option<SshTarget>,
}

impl DbServer {
    /// Build a handle from the parsed wp-config and the source
    /// location. An SSH source runs the clients remotely; `db_host`
    /// overrides the configured host, for configs that point at an
    /// address only reachable from the web server itself.
    pub fn from_wp_config(
        wp_config: &WpConfig,
        source: &Location,
        db_host: Option<&str>,
    ) -> Self {
        Self {
            host: db_host.unwrap_or(&wp_config.db_host).to_string(),
            user: wp_config.db_user.clone(),
            password: wp_config.db_password.clone(),
            db_name: wp_config.db_name.clone(),
            ssh: SshTarget::from_location(source),
        }
    }

    fn client(&self, program: &str, leading_args: &[&str]) -> Command {
        let mut args: Vec<String> = leading_args.iter().map(ToString::to_string).collect();
        args.push("-u".to_string());
        args.push(self.user.clone());
        args.push(format!("-p{}", self.password));
        args.push("-h".to_string());
        args.push(self.host.clone());
        args.push(self.db_name.clone());

        match &self.ssh {
            Some(target) => target.command(program, args),
            None => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        }
    }

    fn refine(&self, err: ExecError) -> ExecError {
        if let (Some(target), ExecError::Failed { code: Some(255), .. }) = (&self.ssh, &err) {
            return ExecError::SshConnection {
                target: target.target(),
            };
        }
        err
    }

    /// Dump the database into the given local file.
    pub async fn dump_to_file(&self, path: &Path) -> Result<(), DbError> {
        debug!(db = %self.db_name, file = %path.display(), "dumping database");

        let file = std::fs::File::create(path)?;
        let mut cmd = self.client("mysqldump", &["--hex-blob"]);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| exec::launch_error("mysqldump", e))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| exec::launch_error("mysqldump", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(&output, "mysqldump", DbError::Dump))
        }
    }

    /// Import a dump from the given local file.
    pub async fn restore_dump(&self, path: &Path) -> Result<(), DbError> {
        debug!(db = %self.db_name, file = %path.display(), "importing dump");

        let file = std::fs::File::open(path)?;
        let mut cmd = self.client("mysql", &[]);
        cmd.stdin(Stdio::from(file))
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| exec::launch_error("mysql", e))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| exec::launch_error("mysql", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(&output, "mysql", DbError::Import))
        }
    }

    /// Run a single SQL statement.
    pub async fn run_query(&self, query: &str) -> Result<(), DbError> {
        debug!(db = %self.db_name, "running query");

        let mut cmd = self.client("mysql", &[]);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| exec::launch_error("mysql", e))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(query.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| exec::launch_error("mysql", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(&output, "mysql", DbError::Query))
        }
    }

    fn failure(
        &self,
        output: &std::process::Output,
        tool: &str,
        variant: fn(String) -> DbError,
    ) -> DbError {
        match self.refine(exec::failure(tool, output)) {
            ExecError::Failed { stderr, .. } => variant(stderr),
            other => DbError::Exec(other),
        }
    }
}

/// Rewrite a SQL dump line by line through a replace map.
///
/// The walker keeps PHP serialized values consistent, so the patched
/// dump imports cleanly even when option blobs contain the replaced
/// text.
pub fn patch_sql_dump(source: &Path, dest: &Path, map: &ReplaceMap) -> Result<(), DbError> {
    let mut reader = BufReader::new(std::fs::File::open(source)?);
    let mut writer = std::io::BufWriter::new(std::fs::File::create(dest)?);

    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        writer.write_all(&walk(&line, map))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> WpConfig {
        WpConfig {
            db_host: "localhost".to_string(),
            db_user: "wp".to_string(),
            db_password: "pw".to_string(),
            db_name: "wordpress".to_string(),
            table_prefix: None,
        }
    }

    #[test]
    fn local_source_runs_client_directly() {
        let db = DbServer::from_wp_config(
            &sample_config(),
            &Location::parse("/var/www"),
            None,
        );
        let cmd = db.client("mysqldump", &["--hex-blob"]);
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "mysqldump");
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["--hex-blob", "-u", "wp", "-ppw", "-h", "localhost", "wordpress"]
        );
    }

    #[test]
    fn remote_source_wraps_client_in_ssh() {
        let db = DbServer::from_wp_config(
            &sample_config(),
            &Location::parse("deploy@web-01:/var/www"),
            None,
        );
        let cmd = db.client("mysql", &[]);
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "ssh");
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], "deploy@web-01");
        assert_eq!(args[1], "mysql");
    }

    #[test]
    fn db_host_override_wins() {
        let db = DbServer::from_wp_config(
            &sample_config(),
            &Location::parse("/var/www"),
            Some("10.0.0.5"),
        );
        let cmd = db.client("mysql", &[]);
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"10.0.0.5".to_string()));
        assert!(!args.contains(&"localhost".to_string()));
    }

    #[test]
    fn patch_rewrites_dump_preserving_serialized_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("dump.sql");
        let dest = dir.path().join("dump.patched.sql");
        std::fs::write(
            &src,
            "INSERT INTO wp_options VALUES ('siteurl', 'http://example.com');\nINSERT INTO wp_options VALUES ('meta', 'a:1:{s:23:\"http://example.com/blog\";}');\n",
        )
        .unwrap();

        let mut map = ReplaceMap::new();
        map.push(&b"http://example.com"[..], &b"https://example.org"[..]);
        patch_sql_dump(&src, &dest, &map).unwrap();

        let patched = std::fs::read_to_string(&dest).unwrap();
        assert!(patched.contains("'siteurl', 'https://example.org'"));
        assert!(patched.contains("s:24:\"https://example.org/blog\""));
    }
}
