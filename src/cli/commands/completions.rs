//! `mtr-setup completions <shell>`: print a completion script to stdout.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

const BIN_NAME: &str = "mtr-setup";

pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

/// Scripts are generated for the installed binary name, whatever argv[0]
/// was.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cli = Cli::command();
    clap_complete::generate(shell, &mut cli, BIN_NAME, out);
}

impl Command for CompletionsCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let stdout = std::io::stdout();
        write_completions(self.args.shell, &mut stdout.lock());
        tracing::debug!(shell = %self.args.shell, "wrote completions");
        Ok(CommandResult::success())
    }
}
