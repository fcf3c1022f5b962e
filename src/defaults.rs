//! Default values for git-get configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Default name of the repository list file.
pub const DEFAULT_CONFIG_FILENAME: &str = "Gitfile";

/// Default name of the ignore list file.
pub const DEFAULT_IGNORE_FILENAME: &str = "Gitfile.ignore";

/// Branch used when a repository entry does not declare a `ref`.
pub const DEFAULT_TRUNK_BRANCH: &str = "master";

/// Number of repositories processed at the same time unless overridden.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Prefix of the scratch directory holding bare clones in mirror mode.
pub const MIRROR_SCRATCH_PREFIX: &str = "gitgetmirror";

/// Number of hex characters kept from the fingerprint digest.
pub const FINGERPRINT_LEN: usize = 7;

/// Returns the default config file location inside `dir`.
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_FILENAME)
}

/// Returns the default ignore file location inside `dir`.
pub fn default_ignore_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_IGNORE_FILENAME)
}
