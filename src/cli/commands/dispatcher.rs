//! Routing from parsed arguments to subcommands.

use crate::cli::args::{Cli, Commands, InstallArgs};
use crate::error::Result;
use crate::host::HostCapabilities;
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

use super::completions::CompletionsCommand;
use super::install::InstallCommand;
use super::schedule::ScheduleCommand;
use super::status::StatusCommand;
use super::uninstall::UninstallCommand;

/// A subcommand ready to run.
///
/// Expected failures (bad answers, missing privileges, a failed child) are
/// reported on `ui` and come back as a non-zero [`CommandResult`]; `Err` is
/// left for faults the command could not describe itself.
pub trait Command {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    /// Process exit status: 0, 1 for failures, 2 for an unusable schedule.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Owns the host view shared by every subcommand: one runner for child
/// processes and the capabilities probed at startup.
pub struct CommandDispatcher<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(runner: &'a dyn CommandRunner, caps: HostCapabilities) -> Self {
        Self { runner, caps }
    }

    pub fn capabilities(&self) -> &HostCapabilities {
        &self.caps
    }

    /// Run the selected subcommand. A bare `mtr-setup` installs.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let command: Box<dyn Command + '_> = match &cli.command {
            Some(Commands::Install(args)) => {
                Box::new(InstallCommand::new(self.runner, &self.caps, args.clone()))
            }
            None => Box::new(InstallCommand::new(
                self.runner,
                &self.caps,
                InstallArgs::default(),
            )),
            Some(Commands::Uninstall(args)) => {
                Box::new(UninstallCommand::new(self.runner, &self.caps, args.clone()))
            }
            Some(Commands::Schedule(args)) => {
                Box::new(ScheduleCommand::new(self.caps.platform, args.clone()))
            }
            Some(Commands::Status(args)) => {
                Box::new(StatusCommand::new(self.runner, &self.caps, args.clone()))
            }
            Some(Commands::Completions(args)) => Box::new(CompletionsCommand::new(args.clone())),
        };
        tracing::debug!(platform = ?self.caps.platform, "dispatching");
        command.execute(ui)
    }
}
