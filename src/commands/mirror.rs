//! Mirror command implementation
//!
//! Mirror-clones every declared repository into a scratch directory and pushes
//! it to `{mirror-url}/{name}.git`, creating missing destinations through the
//! selected provider. With `--dry-run` nothing is pushed and no provider
//! credentials are needed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use git_get::defaults::{DEFAULT_CONCURRENCY, DEFAULT_TRUNK_BRANCH};
use git_get::exec::ShellRunner;
use git_get::mirror::MirrorOptions;
use git_get::orchestrator::{self, MirrorRequest};
use git_get::output::OutputConfig;
use git_get::provider::{self, MirrorProvider, Provider, ProviderKind, Visibility};
use git_get::status::render_table;

use super::config_and_ignore_files;

/// Arguments for the mirror command
#[derive(Args, Debug)]
pub struct MirrorArgs {
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

    /// Destination prefix, e.g. git@gitlab.com:acmeorg/mirrors
    #[arg(short = 'u', long, value_name = "URL")]
    pub mirror_url: String,

    /// Destination provider [gitlab|github|bitbucket]
    #[arg(short = 'm', long, value_name = "PROVIDER", default_value = "gitlab")]
    pub mirror_provider: String,

    /// Visibility of created destinations [private|internal|public]
    #[arg(short = 'v', long, value_name = "MODE", default_value = "private")]
    pub mirror_visibility_mode: String,

    /// Bitbucket project new mirrors are attached to
    #[arg(short = 'b', long, value_name = "NAME")]
    pub bitbucket_mirror_project_name: Option<String>,

    /// Clone mirrors locally without pushing them
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Ref used for repositories that do not declare one
    #[arg(long, value_name = "BRANCH", default_value = DEFAULT_TRUNK_BRANCH)]
    pub default_main_branch: String,

    /// Print a status table once every repository is processed
    #[arg(long)]
    pub status: bool,
}

/// Execute the mirror command
pub fn execute(args: MirrorArgs, output: &OutputConfig) -> Result<()> {
    let kind: ProviderKind = args.mirror_provider.parse()?;
    let visibility: Visibility = args.mirror_visibility_mode.parse()?;

    let destination = if args.dry_run {
        None
    } else {
        let location = provider::decompose_git_url(&args.mirror_url)?;
        Some(Provider::from_env(
            kind,
            &location.host,
            args.bitbucket_mirror_project_name,
        )?)
    };

    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let (config_files, ignore_files) =
        config_and_ignore_files(&current_dir, args.config_files, args.ignore_files);

    let request = MirrorRequest {
        config_files,
        ignore_files,
        concurrency: args.concurrency_level,
        options: MirrorOptions {
            mirror_root: args.mirror_url,
            visibility,
            default_ref: args.default_main_branch,
        },
    };

    let rows = orchestrator::mirror_repositories(
        &request,
        destination.as_ref().map(|p| p as &dyn MirrorProvider),
        &ShellRunner,
    )?;

    if args.status {
        print!("{}", render_table(&rows, output));
    }
    Ok(())
}
