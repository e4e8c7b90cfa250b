//! Shell completions generation command
//!
//! Usage: `fuelops completions bash > ~/.local/share/bash-completion/completions/fuelops`

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use crate::context::GlobalArgs;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub async fn execute(&self, _globals: &GlobalArgs) -> Result<()> {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "fuelops", &mut io::stdout());
        Ok(())
    }
}
