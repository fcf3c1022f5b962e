//! Completions command implementation
//!
//! Writes a `clap_complete` script for the requested shell to stdout, e.g.
//!
//! ```bash
//! git-get completions bash > ~/.local/share/bash-completion/completions/git-get
//! git-get completions zsh > ~/.zfunc/_git-get
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::cli::Cli;

/// Arguments for the completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the completions command
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(args.shell, &mut command, name, &mut io::stdout());
    Ok(())
}
