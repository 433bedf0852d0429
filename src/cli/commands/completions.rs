//! `cardlog completions`: generate shell completion scripts.
//!
//! Usage:
//!   cardlog completions bash > ~/.local/share/bash-completion/completions/cardlog
//!   cardlog completions zsh > ~/.zfunc/_cardlog
//!   cardlog completions fish > ~/.config/fish/completions/cardlog.fish

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Render the completion script for `shell` into `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    Ok(())
}
