//! Config-gen command implementation
//!
//! Enumerates the repositories of a user, organisation, workspace or GitLab
//! group and writes them as a configuration file that `get` and `mirror` can
//! read.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use git_get::config;
use git_get::defaults;
use git_get::generate::{self, CloneScheme};
use git_get::ignore::IgnoreSet;
use git_get::provider::{self, OwnerFilters, Provider, ProviderKind};

use super::files_or_default;

/// Arguments for the config-gen command
#[derive(Args, Debug)]
pub struct ConfigGenArgs {
    /// Configuration file to write (default: ./Gitfile)
    #[arg(short = 'f', long = "config-file", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Ignore file (repeatable, default: ./Gitfile.ignore)
    #[arg(short = 'i', long = "ignore-file", value_name = "PATH")]
    pub ignore_files: Vec<PathBuf>,

    /// Provider to enumerate [gitlab|github|bitbucket]
    #[arg(short = 'p', long, value_name = "PROVIDER", default_value = "gitlab")]
    pub config_provider: String,

    /// Owner URL, e.g. git@github.com:acmeorg or git@gitlab.com:acmeorg/kube
    #[arg(short = 'u', long, value_name = "URL")]
    pub config_url: String,

    /// Directory set as 'path' of every generated repository
    #[arg(short = 't', long, value_name = "PATH", default_value = "")]
    pub target_clone_path: String,

    /// Write ssh clone URLs (default)
    #[arg(long, conflicts_with = "https")]
    pub ssh: bool,

    /// Write https clone URLs
    #[arg(long)]
    pub https: bool,

    /// GitLab: only projects owned by the user
    #[arg(long)]
    pub gitlab_owned: bool,

    /// GitLab: project visibility [public|internal|private]
    #[arg(long, value_name = "VISIBILITY", default_value = "")]
    pub gitlab_project_visibility: String,

    /// GitLab: minimal access level [unspecified|min|guest|reporter|developer|maintainer|owner]
    #[arg(long, value_name = "LEVEL", default_value = "unspecified")]
    pub gitlab_groups_minimal_access_level: String,

    /// GitHub: visibility [all|public|private]
    #[arg(long, value_name = "VISIBILITY", default_value = "all")]
    pub github_visibility: String,

    /// GitHub: comma-separated list of owner, collaborator, organization_member
    #[arg(
        long,
        value_name = "LIST",
        default_value = "owner,collaborator,organization_member"
    )]
    pub github_affiliation: String,

    /// Bitbucket: role [owner|admin|contributor|member]
    #[arg(long, value_name = "ROLE", default_value = "member")]
    pub bitbucket_role: String,
}

/// Execute the config-gen command
pub fn execute(args: ConfigGenArgs) -> Result<()> {
    let kind: ProviderKind = args.config_provider.parse()?;
    let owner = provider::decompose_git_url(&args.config_url)?;
    let provider = Provider::from_env(kind, &owner.host, None)?;

    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let output_path = args
        .config_file
        .unwrap_or_else(|| defaults::default_config_path(&current_dir));
    let ignore_files = files_or_default(args.ignore_files, || {
        defaults::default_ignore_path(&current_dir)
    });
    let ignore = IgnoreSet::from_entries(&config::load_ignore_entries(&ignore_files)?);

    let scheme = if args.https && !args.ssh {
        CloneScheme::Https
    } else {
        CloneScheme::Ssh
    };
    let filters = OwnerFilters {
        gitlab_owned: args.gitlab_owned,
        gitlab_visibility: args.gitlab_project_visibility,
        gitlab_min_access_level: args.gitlab_groups_minimal_access_level,
        github_visibility: args.github_visibility,
        github_affiliation: args.github_affiliation,
        bitbucket_role: args.bitbucket_role,
    };

    let specs = generate::generate(
        &provider,
        &owner.full_path,
        &filters,
        scheme,
        &args.target_clone_path,
        &ignore,
    )?;
    generate::write_config(&output_path, &specs)?;
    Ok(())
}
