//! Schedule preview.
//!
//! The `mtr-setup schedule` command computes the run plan for a logging
//! frequency and prints the scheduler entries an install would register.
//! Nothing on the host is read or changed.

use crate::cli::args::ScheduleArgs;
use crate::config::DesiredConfig;
use crate::error::Result;
use crate::jobs::{CrontabBackend, JobDescriptor, SchedulerBackend, TaskSchedulerBackend};
use crate::schedule::ScheduleSpec;
use crate::shell::{Platform, SystemRunner};
use crate::ui::UserInterface;
use crate::venv::venv_python;

use super::dispatcher::{Command, CommandResult};
use super::display::report_failure;

/// The schedule command implementation.
pub struct ScheduleCommand {
    platform: Platform,
    args: ScheduleArgs,
}

impl ScheduleCommand {
    /// Create a new schedule command for entries of `platform`.
    pub fn new(platform: Platform, args: ScheduleArgs) -> Self {
        Self { platform, args }
    }

    /// The logger and archiver entries, rendered for this platform.
    fn rendered_entries(&self, spec: &ScheduleSpec) -> Result<Vec<String>> {
        let mut config = DesiredConfig::for_platform(self.platform);
        config.logs_per_hour = self.args.logs_per_hour;
        config.safety_margin_sec = self.args.safety_margin;
        let python = venv_python(&config.venv_dir(), self.platform);
        let jobs = [
            JobDescriptor::logger(&config, &python, spec),
            JobDescriptor::archiver(&config, &python),
        ];

        let backend: Box<dyn SchedulerBackend> = if self.platform.is_windows() {
            Box::new(TaskSchedulerBackend::new(&SystemRunner, config.jobs_dir()))
        } else {
            Box::new(CrontabBackend::new(&SystemRunner))
        };
        jobs.iter().map(|job| backend.render(job)).collect()
    }
}

impl Command for ScheduleCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let spec = match ScheduleSpec::compute(self.args.logs_per_hour, self.args.safety_margin) {
            Ok(spec) => spec,
            Err(e) => return Ok(report_failure(ui, &e)),
        };

        ui.show_header("Schedule");
        ui.message(&format!("  Runs per hour:  {}", spec.runs_per_hour()));
        ui.message(&format!("  Every:          {} min", spec.step_minutes));
        ui.message(&format!("  Window:         {}s", spec.window_seconds));
        ui.message(&format!("  Run duration:   {}s", spec.duration_seconds));
        ui.message(&format!("  Minute marks:   {}", spec.minute_field()));
        ui.message("");
        ui.message("Entries:");
        for entry in self.rendered_entries(&spec)? {
            ui.message(&format!("  {entry}"));
        }
        Ok(CommandResult::success())
    }
}
