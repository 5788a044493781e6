//! Install command implementation.
//!
//! The `mtr-setup install` command layers the configuration, asks the
//! questionnaire and runs the install pipeline.

use crate::cli::args::InstallArgs;
use crate::config::{collect, layered_config, DesiredConfig};
use crate::error::Result;
use crate::fetch::Downloader;
use crate::host::HostCapabilities;
use crate::pipeline::{InstallOptions, InstallPipeline, InstallReport};
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::report_failure;

/// The install command implementation.
pub struct InstallCommand<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
    args: InstallArgs,
}

impl<'a> InstallCommand<'a> {
    /// Create a new install command.
    pub fn new(runner: &'a dyn CommandRunner, caps: &HostCapabilities, args: InstallArgs) -> Self {
        Self {
            runner,
            caps: caps.clone(),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }

    fn configure(&self, ui: &mut dyn UserInterface) -> Result<DesiredConfig> {
        let base = layered_config(self.args.answers.as_deref(), &self.args.overrides())?;
        collect(base, ui)
    }

    fn options(&self) -> InstallOptions {
        InstallOptions {
            allow_runtime_install: !self.args.no_runtime_install,
            skip_self_test: self.args.skip_self_test,
        }
    }
}

impl Command for InstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.configure(ui) {
            Ok(config) => config,
            Err(e) => return Ok(report_failure(ui, &e)),
        };

        let downloader = Downloader::new();
        let pipeline =
            InstallPipeline::new(self.runner, self.caps.clone(), &downloader, self.options());
        match pipeline.run(&config, ui) {
            Ok(report) => {
                show_summary(ui, &config, &report);
                Ok(CommandResult::success())
            }
            Err(e) => Ok(report_failure(ui, &e)),
        }
    }
}

fn show_summary(ui: &mut dyn UserInterface, config: &DesiredConfig, report: &InstallReport) {
    ui.message("");
    ui.message(&format!("  Root:     {}", config.install_root.display()));
    if let Some(version) = &report.state.runtime_version {
        ui.message(&format!("  Python:   {version}"));
    }
    if let Some(commit) = &report.state.commit {
        ui.message(&format!("  Commit:   {commit}"));
    }
    ui.message(&format!(
        "  Schedule: {} report(s)/hour at minute {}, {}s each",
        report.schedule.runs_per_hour(),
        report.schedule.minute_field(),
        report.schedule.duration_seconds
    ));
    ui.message(&format!("  Logs:     {}", config.log_dir.display()));
    if let Some(wrapper) = &report.state.wrapper_path {
        ui.message(&format!("  Command:  {}", wrapper.display()));
    }
    if report.self_test_passed == Some(false) {
        ui.message(&format!(
            "  Try it by hand: {} {}",
            config.command_name, config.target
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockRunner, Platform};
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn caps(elevated: bool) -> HostCapabilities {
        HostCapabilities::detect_with(Platform::Linux, elevated, &[])
    }

    #[test]
    fn invalid_frequency_exits_two_before_any_host_change() {
        let temp = TempDir::new().unwrap();
        let answers = temp.path().join("answers.yml");
        fs::write(&answers, "logs_per_hour: 7\n").unwrap();

        let runner = MockRunner::new();
        let args = InstallArgs {
            answers: Some(answers),
            ..Default::default()
        };
        let mut ui = MockUI::new();
        let result = InstallCommand::new(&runner, &caps(true), args)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn unprivileged_run_exits_one() {
        let runner = MockRunner::new();
        let mut ui = MockUI::new();
        let result = InstallCommand::new(&runner, &caps(false), InstallArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(!ui.errors().is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_answers_file_is_reported() {
        let runner = MockRunner::new();
        let args = InstallArgs {
            answers: Some("/nonexistent/answers.yml".into()),
            ..Default::default()
        };
        let mut ui = MockUI::new();
        let result = InstallCommand::new(&runner, &caps(true), args)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("answers.yml"));
    }

    #[test]
    fn flags_map_to_options() {
        let runner = MockRunner::new();
        let args = InstallArgs {
            no_runtime_install: true,
            skip_self_test: true,
            ..Default::default()
        };
        let options = InstallCommand::new(&runner, &caps(true), args).options();
        assert!(!options.allow_runtime_install);
        assert!(options.skip_self_test);
    }
}
