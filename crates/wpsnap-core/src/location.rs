//! Source and destination locations for snapshot data.
//!
//! A location is either a plain local path or a `user@host:path` triple
//! reached over SSH. This is not a generic filesystem abstraction: each
//! operation on a location is implemented in `wpsnap-runtime` the most
//! direct way for its kind (local syscalls, or a remote command).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static SSH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_-]+)@((?:[a-zA-Z0-9-]+\.)*(?:[a-zA-Z0-9-]+)):(.*)$")
        .expect("SSH location regex is valid")
});

/// A local or remote file/directory location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A path on the machine running wpsnap.
    Local {
        /// Filesystem path, absolute or relative.
        path: String,
    },
    /// A path on a remote host reached over SSH.
    Ssh {
        /// Remote login user.
        user: String,
        /// Remote host name.
        host: String,
        /// Path on the remote host.
        path: String,
    },
}

impl Location {
    /// Guess the location type from its textual form.
    ///
    /// `user@host:path` becomes an SSH location, anything else is local.
    pub fn parse(input: &str) -> Self {
        if let Some(caps) = SSH_RE.captures(input) {
            Self::Ssh {
                user: caps[1].to_string(),
                host: caps[2].to_string(),
                path: caps[3].to_string(),
            }
        } else {
            Self::Local {
                path: input.to_string(),
            }
        }
    }

    /// The path component, local or remote.
    pub fn path(&self) -> &str {
        match self {
            Self::Local { path } | Self::Ssh { path, .. } => path,
        }
    }

    /// Whether this location lives on a remote host.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Ssh { .. })
    }

    /// The `user@host` pair for SSH locations.
    pub fn ssh_target(&self) -> Option<String> {
        match self {
            Self::Local { .. } => None,
            Self::Ssh { user, host, .. } => Some(format!("{user}@{host}")),
        }
    }

    /// Location of a child file or directory named `name`.
    ///
    /// Remote paths always use POSIX separators, so joining is plain
    /// string work on both variants.
    pub fn child(&self, name: &str) -> Self {
        let joined = join_posix(self.path(), name);
        match self {
            Self::Local { .. } => Self::Local { path: joined },
            Self::Ssh { user, host, .. } => Self::Ssh {
                user: user.clone(),
                host: host.clone(),
                path: joined,
            },
        }
    }

    /// The equivalent rsync path for this location.
    ///
    /// rsync treats a trailing slash as "contents of", so directory
    /// endpoints get one appended and file endpoints get it stripped.
    pub fn rsync_path(&self, as_dir: bool) -> String {
        let mut path = self.to_string();

        if as_dir && !path.ends_with('/') {
            path.push('/');
        } else if !as_dir && path.ends_with('/') {
            path.pop();
        }

        path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{path}"),
            Self::Ssh { user, host, path } => write!(f, "{user}@{host}:{path}"),
        }
    }
}

fn join_posix(base: &str, name: &str) -> String {
    if name.starts_with('/') {
        return name.to_string();
    }
    if base.is_empty() {
        return name.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ssh_syntax() {
        let loc = Location::parse("deploy@web-01.example.com:/var/www");
        assert_eq!(
            loc,
            Location::Ssh {
                user: "deploy".to_string(),
                host: "web-01.example.com".to_string(),
                path: "/var/www".to_string(),
            }
        );
        assert_eq!(loc.ssh_target().as_deref(), Some("deploy@web-01.example.com"));
    }

    #[test]
    fn parses_plain_path_as_local() {
        let loc = Location::parse("/var/www");
        assert_eq!(
            loc,
            Location::Local {
                path: "/var/www".to_string()
            }
        );
        assert!(!loc.is_remote());
    }

    #[test]
    fn path_with_at_but_no_colon_is_local() {
        let loc = Location::parse("/srv/user@host");
        assert!(!loc.is_remote());
    }

    #[test]
    fn child_joins_posix_paths() {
        let loc = Location::parse("deploy@host:/srv/backups");
        assert_eq!(loc.child("snap.tar.gz").to_string(), "deploy@host:/srv/backups/snap.tar.gz");

        let trailing = Location::parse("/srv/backups/");
        assert_eq!(trailing.child("snap.tar.gz").path(), "/srv/backups/snap.tar.gz");
    }

    #[test]
    fn rsync_path_normalizes_trailing_slash() {
        let loc = Location::parse("deploy@host:/var/www");
        assert_eq!(loc.rsync_path(true), "deploy@host:/var/www/");
        assert_eq!(loc.rsync_path(false), "deploy@host:/var/www");

        let dir = Location::parse("/var/www/");
        assert_eq!(dir.rsync_path(false), "/var/www");
    }

    #[test]
    fn display_round_trips() {
        for raw in ["/var/www", "deploy@host:/var/www", "deploy@host:relative/dir"] {
            assert_eq!(Location::parse(raw).to_string(), raw);
        }
    }
}
