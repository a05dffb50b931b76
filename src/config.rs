//! Collection settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory the GPFS administrative commands are installed to.
pub const DEFAULT_BIN_DIR: &str = "/usr/lpp/mmfs/bin";

/// Upper bound for a single administrative command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Substrings that mark a file system as not locally administrable.
pub const DEFAULT_EXCLUDES: [&str; 2] = [":", "remote"];

/// Settings shared by all collection cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    bin_dir: PathBuf,
    timeout: Duration,
    excludes: Vec<String>,
}

impl Config {
    /// Returns a config with the given settings.
    #[must_use]
    pub fn new(
        bin_dir: impl Into<PathBuf>,
        timeout: Duration,
        excludes: Vec<String>,
    ) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            timeout,
            excludes,
        }
    }

    /// Returns the directory containing `mmpmon`, `mmlspool` etc.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Returns the full path of the administrative command `name`.
    #[must_use]
    pub fn command(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the substrings excluding a file system from pool, fileset and
    /// quota collection.
    #[must_use]
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Returns `true` if the file system may be queried locally.
    #[must_use]
    pub fn is_candidate(&self, fs: &str) -> bool {
        !self.excludes.iter().any(|needle| fs.contains(needle.as_str()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_BIN_DIR,
            DEFAULT_TIMEOUT,
            DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
        )
    }
}
