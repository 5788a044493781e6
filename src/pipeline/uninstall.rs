//! The uninstall routine.
//!
//! Mirrors the generated uninstall script: confirm, remove jobs, the
//! install root, the `PATH` entry and the wrappers, then ask separately
//! about logs.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::DesiredConfig;
use crate::error::{Result, SetupError};
use crate::host::HostCapabilities;
use crate::jobs::cron::{lock_file, LOCK_DIR};
use crate::jobs::{backend_for, JobRegistrar, SchedulerBackend, ARCHIVER_JOB, LOGGER_JOB};
use crate::publish::{EntryPointPublisher, PROFILE_DIR};
use crate::shell::CommandRunner;
use crate::state::InstallationState;
use crate::ui::{Prompt, UserInterface};

#[derive(Debug, Clone, Default)]
pub struct UninstallOptions {
    /// Skip the main confirmation.
    pub assume_yes: bool,
    /// Remove logs without asking.
    pub purge_logs: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub aborted: bool,
    pub removed_jobs: Vec<String>,
    pub logs_removed: bool,
}

pub struct Uninstaller<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
    options: UninstallOptions,
    backend: Option<Box<dyn SchedulerBackend + 'a>>,
    profile_dir: PathBuf,
    lock_dir: PathBuf,
}

impl<'a> Uninstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, caps: HostCapabilities, options: UninstallOptions) -> Self {
        Self {
            runner,
            caps,
            options,
            backend: None,
            profile_dir: PathBuf::from(PROFILE_DIR),
            lock_dir: PathBuf::from(LOCK_DIR),
        }
    }

    pub fn with_scheduler(mut self, backend: Box<dyn SchedulerBackend + 'a>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = dir.into();
        self
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    /// Remove the installation rooted at `config.install_root`. Paths
    /// recorded in its state file take precedence over `config`.
    pub fn run(self, config: &DesiredConfig, ui: &mut dyn UserInterface) -> Result<UninstallReport> {
        let state = InstallationState::load(&config.state_file())?;
        let config = effective_config(config, state.as_ref());
        let job_names = match &state {
            Some(state) if !state.registered_jobs.is_empty() => state.registered_jobs.clone(),
            Some(_) => Vec::new(),
            None => {
                ui.warning(&format!(
                    "No install state in {}; removing default locations",
                    config.install_root.display()
                ));
                vec![LOGGER_JOB.to_string(), ARCHIVER_JOB.to_string()]
            }
        };

        ui.show_header(&format!("Uninstalling {}", config.command_name));
        if !self.options.assume_yes {
            let question = format!(
                "Remove {} and its scheduled jobs from this host?",
                config.command_name
            );
            let answer = ui.prompt(&Prompt::confirm("confirm_uninstall", &question, false))?;
            if !answer.as_bool().unwrap_or(false) {
                ui.message("Aborted");
                return Ok(UninstallReport {
                    aborted: true,
                    ..Default::default()
                });
            }
        }

        if !self.caps.elevated {
            return Err(SetupError::ElevationRequired {
                message: "uninstall needs the same privileges as install".to_string(),
            });
        }

        let mut report = UninstallReport::default();

        // Jobs first, so nothing fires against a half-removed install.
        let backend = match self.backend {
            Some(backend) => Some(backend),
            None => match backend_for(self.caps.scheduler, self.runner, &config.jobs_dir()) {
                Ok(backend) => Some(backend),
                Err(err) => {
                    ui.warning(&format!("Scheduled jobs left in place: {err}"));
                    None
                }
            },
        };
        if let Some(backend) = backend {
            JobRegistrar::new(backend.as_ref()).unregister(&job_names)?;
            for name in &job_names {
                ui.success(&format!("Removed job {name}"));
            }
            report.removed_jobs = job_names.clone();
        }
        if !self.caps.platform.is_windows() {
            for name in &job_names {
                let _ = fs::remove_file(lock_file(&self.lock_dir, name));
            }
        }

        if config.install_root.exists() {
            fs::remove_dir_all(&config.install_root)?;
            ui.success(&format!("Removed {}", config.install_root.display()));
        }

        EntryPointPublisher::new(self.runner, self.caps.platform)
            .with_profile_dir(&self.profile_dir)
            .unpublish(&config)?;
        ui.success("Removed wrapper and PATH entry");

        let purge = self.options.purge_logs || {
            let question = format!("Also delete logs in {}?", config.log_dir.display());
            ui.prompt(&Prompt::confirm("purge_logs", &question, false))?
                .as_bool()
                .unwrap_or(false)
        };
        if purge && config.log_dir.exists() {
            fs::remove_dir_all(&config.log_dir)?;
            report.logs_removed = true;
            ui.success(&format!("Removed {}", config.log_dir.display()));
        } else if !purge {
            info!("keeping logs in {}", config.log_dir.display());
        }

        if report.removed_jobs.is_empty() && !job_names.is_empty() {
            warn!("jobs were not removed: {:?}", job_names);
        }
        ui.success(&format!("{} removed", config.command_name));
        Ok(report)
    }
}

/// `config` with the locations an earlier install recorded.
fn effective_config(config: &DesiredConfig, state: Option<&InstallationState>) -> DesiredConfig {
    let mut config = config.clone();
    let Some(state) = state else {
        return config;
    };
    if let Some(wrapper) = &state.wrapper_path {
        if let Some(dir) = wrapper.parent() {
            config.bin_dir = dir.to_path_buf();
        }
        if let Some(stem) = wrapper.file_stem() {
            config.command_name = stem.to_string_lossy().into_owned();
        }
    }
    if let Some(log_dir) = &state.log_dir {
        config.log_dir = log_dir.clone();
    }
    config
}
