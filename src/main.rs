//! # git-get CLI
//!
//! This is the binary entry point for the `git-get` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors: a fatal error is printed to
//!   standard error and the process exits with a non-zero status.
//!
//! The reconciliation logic lives in the `git_get` library crate; the binary
//! only turns flags into run configuration.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
