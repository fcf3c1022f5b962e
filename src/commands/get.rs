//! Get command implementation
//!
//! Clones every repository declared in the configuration files that is not
//! there yet and refreshes the ones that are, `concurrency-level` at a time.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use git_get::defaults::{DEFAULT_CONCURRENCY, DEFAULT_TRUNK_BRANCH};
use git_get::exec::ShellRunner;
use git_get::orchestrator::{self, GetRequest};
use git_get::output::OutputConfig;
use git_get::reconcile::GetOptions;
use git_get::status::render_table;

use super::config_and_ignore_files;

/// Arguments for the get command
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Configuration file (repeatable, default: ./Gitfile)
    #[arg(
        short = 'f',
        long = "config-file",
        value_name = "PATH",
        env = "GIT_GET_CONFIG"
    )]
    pub config_files: Vec<PathBuf>,

    /// Ignore file (repeatable, default: ./Gitfile.ignore)
    #[arg(short = 'i', long = "ignore-file", value_name = "PATH")]
    pub ignore_files: Vec<PathBuf>,

    /// Number of repositories processed at the same time
    #[arg(short = 'c', long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency_level: usize,

    /// Stay on the declared ref after refreshing
    #[arg(short = 't', long)]
    pub stay_on_ref: bool,

    /// Replace repositories with depth 1 clones without .git
    #[arg(short = 's', long)]
    pub shallow: bool,

    /// Ref used for repositories that do not declare one
    #[arg(short = 'b', long, value_name = "BRANCH", default_value = DEFAULT_TRUNK_BRANCH)]
    pub default_main_branch: String,

    /// Directory repositories and symlinks are placed in (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub working_dir: Option<PathBuf>,

    /// Print a status table once every repository is processed
    #[arg(long)]
    pub status: bool,
}

/// Execute the get command
pub fn execute(args: GetArgs, output: &OutputConfig) -> Result<()> {
    let working_dir = match args.working_dir {
        Some(dir) => std::path::absolute(&dir)
            .with_context(|| format!("Cannot resolve working directory {}", dir.display()))?,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    fs::create_dir_all(&working_dir).with_context(|| {
        format!(
            "Cannot create working directory {}",
            working_dir.display()
        )
    })?;

    let (config_files, ignore_files) =
        config_and_ignore_files(&working_dir, args.config_files, args.ignore_files);

    let request = GetRequest {
        config_files,
        ignore_files,
        concurrency: args.concurrency_level,
        options: GetOptions {
            base_dir: working_dir,
            default_ref: args.default_main_branch,
            stay_on_ref: args.stay_on_ref,
            shallow: args.shallow,
            output: output.clone(),
        },
    };

    let rows = orchestrator::get_repositories(&request, &ShellRunner)?;

    if args.status {
        print!("{}", render_table(&rows, output));
    }
    Ok(())
}
