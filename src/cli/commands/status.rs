//! Status command implementation.
//!
//! The `mtr-setup status` command shows the recorded installation and
//! whether each registered job is still known to the host scheduler.

use crate::cli::args::StatusArgs;
use crate::config::DesiredConfig;
use crate::error::Result;
use crate::host::HostCapabilities;
use crate::jobs::{backend_for, JobRegistrar, SchedulerBackend};
use crate::shell::CommandRunner;
use crate::state::InstallationState;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{self, report_failure};

/// The status command implementation.
pub struct StatusCommand<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
    args: StatusArgs,
    backend: Option<Box<dyn SchedulerBackend + 'a>>,
}

impl<'a> StatusCommand<'a> {
    /// Create a new status command.
    pub fn new(runner: &'a dyn CommandRunner, caps: &HostCapabilities, args: StatusArgs) -> Self {
        Self {
            runner,
            caps: caps.clone(),
            args,
            backend: None,
        }
    }

    /// Query `backend` instead of the detected scheduler.
    pub fn with_scheduler(mut self, backend: Box<dyn SchedulerBackend + 'a>) -> Self {
        self.backend = Some(backend);
        self
    }

    fn config(&self) -> DesiredConfig {
        let mut config = DesiredConfig::for_platform(self.caps.platform);
        if let Some(root) = &self.args.install_root {
            config.install_root = root.clone();
        }
        config
    }

    fn show_jobs(&self, ui: &mut dyn UserInterface, config: &DesiredConfig, jobs: &[String]) -> Result<()> {
        ui.message("");
        ui.message("Jobs:");
        if jobs.is_empty() {
            ui.message("  (none registered)");
            return Ok(());
        }

        let detected;
        let backend = match &self.backend {
            Some(backend) => backend.as_ref(),
            None => match backend_for(self.caps.scheduler, self.runner, &config.jobs_dir()) {
                Ok(backend) => {
                    detected = backend;
                    detected.as_ref()
                }
                Err(e) => {
                    ui.warning(&e.to_string());
                    return Ok(());
                }
            },
        };
        for (name, present) in JobRegistrar::new(backend).status(jobs)? {
            display::show_job_status(ui, &name, present);
        }
        Ok(())
    }
}

impl Command for StatusCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.config();
        let state = match InstallationState::load(&config.state_file()) {
            Ok(Some(state)) => state,
            Ok(None) => {
                ui.error(&format!(
                    "No installation found in {}. Run 'mtr-setup install' first.",
                    config.install_root.display()
                ));
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Ok(report_failure(ui, &e)),
        };

        ui.show_header("mtr-logger - Status");
        ui.message(&format!("Installed: {}", state.installed_at.format("%Y-%m-%d %H:%M")));
        ui.message(&format!("Updated:   {}", state.updated_at.format("%Y-%m-%d %H:%M")));
        ui.message(&format!("Root:      {}", state.install_root.display()));
        if let (Some(exe), Some(version)) = (&state.runtime_exe, &state.runtime_version) {
            ui.message(&format!("Python:    {} ({})", version, exe.display()));
        }
        if let Some(commit) = &state.commit {
            ui.message(&format!("Commit:    {commit}"));
        }
        if let Some(wrapper) = &state.wrapper_path {
            ui.message(&format!("Command:   {}", wrapper.display()));
        }
        if let Some(spec) = &state.schedule {
            ui.message(&format!(
                "Schedule:  minute {} for {}s",
                spec.minute_field(),
                spec.duration_seconds
            ));
        }
        if let Some(log_dir) = &state.log_dir {
            ui.message(&format!("Logs:      {}", log_dir.display()));
        }

        self.show_jobs(ui, &config, &state.registered_jobs)?;
        Ok(CommandResult::success())
    }
}
