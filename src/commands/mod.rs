//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `git-get`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, turns them into the
//!   explicit run configuration of the `git_get` library and runs it.

pub mod completions;
pub mod config_gen;
pub mod get;
pub mod mirror;

use std::path::{Path, PathBuf};

/// Uses `given` unless it is empty, in which case `default` is the only file.
fn files_or_default(given: Vec<PathBuf>, default: impl FnOnce() -> PathBuf) -> Vec<PathBuf> {
    if given.is_empty() {
        vec![default()]
    } else {
        given
    }
}

/// Resolves the default `Gitfile` and `Gitfile.ignore` locations in `dir`.
fn config_and_ignore_files(
    dir: &Path,
    config_files: Vec<PathBuf>,
    ignore_files: Vec<PathBuf>,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    (
        files_or_default(config_files, || git_get::defaults::default_config_path(dir)),
        files_or_default(ignore_files, || git_get::defaults::default_ignore_path(dir)),
    )
}
