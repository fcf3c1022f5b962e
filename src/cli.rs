//! CLI argument parsing and command dispatch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use git_get::output::OutputConfig;

use crate::commands;

/// git-get - Clone, refresh and mirror a declared fleet of git repositories
#[derive(Parser, Debug)]
#[command(name = "git-get")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (default: get)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Options of `get` when no subcommand is given
    #[command(flatten)]
    get: commands::get::GetArgs,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(
        short = 'l',
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "info"
    )]
    log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone or refresh every repository listed in the configuration files
    Get(commands::get::GetArgs),

    /// Mirror every repository listed in the configuration files to another provider
    Mirror(commands::mirror::MirrorArgs),

    /// Create a configuration file from the repositories of a provider owner
    ConfigGen(commands::config_gen::ConfigGenArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level)?;
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            None => commands::get::execute(self.get, &output),
            Some(Commands::Get(args)) => commands::get::execute(args, &output),
            Some(Commands::Mirror(args)) => commands::mirror::execute(args, &output),
            Some(Commands::ConfigGen(args)) => commands::config_gen::execute(args),
            Some(Commands::Completions(args)) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: LevelFilter) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .format_target(false)
        .try_init()
        .context("Failed to initialize logging")
}
