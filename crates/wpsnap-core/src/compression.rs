//! Archive compression modes.
//!
//! Snapshots are tar archives; the compression mode decides the tar
//! flag and the file extension. The default snapshot file-name template
//! ends in `.gz`, so non-default modes rewrite that suffix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compression applied to snapshot archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// gzip, the default.
    #[default]
    Gzip,
    /// bzip2.
    Bzip2,
    /// lzip.
    Lzip,
    /// xz.
    Xz,
}

/// Error for unrecognized compression mode names.
#[derive(Debug, Error)]
#[error("unknown compression mode `{0}` (expected gzip, bzip2, lzip or xz)")]
pub struct ParseCompressionError(String);

impl Compression {
    /// The tar flag selecting this compression mode.
    pub const fn tar_flag(self) -> &'static str {
        match self {
            Self::Gzip => "-z",
            Self::Bzip2 => "-j",
            Self::Lzip => "--lzip",
            Self::Xz => "-J",
        }
    }

    /// The file extension for archives in this mode, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
            Self::Lzip => "lz",
            Self::Xz => "xz",
        }
    }

    /// Rewrite the `.gz` suffix of a file-name template for this mode.
    pub fn rewrite_template(self, template: &str) -> String {
        if self == Self::Gzip {
            return template.to_string();
        }
        template.replace(".gz", &format!(".{}", self.extension()))
    }

    /// Guess the compression mode of an existing archive from its name.
    ///
    /// Unknown extensions fall back to gzip, matching the default
    /// snapshot template.
    pub fn from_archive_name(name: &str) -> Self {
        if name.ends_with(".bz2") {
            Self::Bzip2
        } else if name.ends_with(".lz") {
            Self::Lzip
        } else if name.ends_with(".xz") {
            Self::Xz
        } else {
            Self::Gzip
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Lzip => "lzip",
            Self::Xz => "xz",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Compression {
    type Err = ParseCompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Self::Gzip),
            "bzip2" => Ok(Self::Bzip2),
            "lzip" => Ok(Self::Lzip),
            "xz" => Ok(Self::Xz),
            other => Err(ParseCompressionError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_default_template_suffix() {
        assert_eq!(
            Compression::Bzip2.rewrite_template("{base}_{time}.tar.gz"),
            "{base}_{time}.tar.bz2"
        );
        assert_eq!(
            Compression::Xz.rewrite_template("{base}_{time}.tar.gz"),
            "{base}_{time}.tar.xz"
        );
        assert_eq!(
            Compression::Gzip.rewrite_template("{base}_{time}.tar.gz"),
            "{base}_{time}.tar.gz"
        );
    }

    #[test]
    fn guesses_mode_from_archive_name() {
        assert_eq!(Compression::from_archive_name("snap.tar.gz"), Compression::Gzip);
        assert_eq!(Compression::from_archive_name("snap.tar.bz2"), Compression::Bzip2);
        assert_eq!(Compression::from_archive_name("snap.tar.lz"), Compression::Lzip);
        assert_eq!(Compression::from_archive_name("snap.tar.xz"), Compression::Xz);
        assert_eq!(Compression::from_archive_name("snap.tar"), Compression::Gzip);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("xz".parse::<Compression>().unwrap(), Compression::Xz);
        assert!("zstd".parse::<Compression>().is_err());
    }
}
