//! Uninstall command implementation.
//!
//! The `mtr-setup uninstall` command removes what `install` put on the host.

use crate::cli::args::UninstallArgs;
use crate::config::DesiredConfig;
use crate::error::Result;
use crate::host::HostCapabilities;
use crate::pipeline::{UninstallOptions, Uninstaller};
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::report_failure;

/// The uninstall command implementation.
pub struct UninstallCommand<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
    args: UninstallArgs,
}

impl<'a> UninstallCommand<'a> {
    /// Create a new uninstall command.
    pub fn new(runner: &'a dyn CommandRunner, caps: &HostCapabilities, args: UninstallArgs) -> Self {
        Self {
            runner,
            caps: caps.clone(),
            args,
        }
    }

    fn config(&self) -> DesiredConfig {
        let mut config = DesiredConfig::for_platform(self.caps.platform);
        if let Some(root) = &self.args.install_root {
            config.install_root = root.clone();
        }
        config
    }
}

impl Command for UninstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let options = UninstallOptions {
            assume_yes: self.args.yes,
            purge_logs: self.args.purge_logs,
        };
        let uninstaller = Uninstaller::new(self.runner, self.caps.clone(), options);
        match uninstaller.run(&self.config(), ui) {
            Ok(report) if report.aborted => Ok(CommandResult::failure(1)),
            Ok(_) => Ok(CommandResult::success()),
            Err(e) => Ok(report_failure(ui, &e)),
        }
    }
}
