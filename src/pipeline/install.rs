//! The install pipeline.
//!
//! Eight strictly ordered steps, each a hard precondition for the next.
//! Everything that can be rejected without touching the host (schedule,
//! version floor, privileges) is checked in step 1. A failure later leaves
//! completed steps in place; re-running is the recovery path, and every
//! step is safe to repeat.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::DesiredConfig;
use crate::error::{Result, SetupError};
use crate::fetch::Downloader;
use crate::host::HostCapabilities;
use crate::jobs::{
    backend_for, JobDescriptor, JobRegistrar, SchedulerBackend, ARCHIVER_JOB, LOGGER_JOB,
};
use crate::jobs::cron::LOCK_DIR;
use crate::publish::{EntryPointPublisher, PROFILE_DIR};
use crate::repo::RepoSynchronizer;
use crate::runtime::{
    remove_stubs, resolve_or_install, windows_apps_dir, ProbeContext, RuntimeInstaller,
    RuntimeResolver, RuntimeVersion,
};
use crate::schedule::ScheduleSpec;
use crate::selftest::run_self_test;
use crate::shell::CommandRunner;
use crate::state::InstallationState;
use crate::ui::UserInterface;
use crate::venv::EnvironmentProvisioner;

/// Number of reported steps.
pub const INSTALL_STEPS: usize = 8;

/// Switches that change what the pipeline may do.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Install a runtime unattended when none is found.
    pub allow_runtime_install: bool,
    pub skip_self_test: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            allow_runtime_install: true,
            skip_self_test: false,
        }
    }
}

/// What a completed install produced.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub state: InstallationState,
    pub schedule: ScheduleSpec,
    /// `None` when skipped.
    pub self_test_passed: Option<bool>,
}

/// Runs the whole install against injected host capabilities.
pub struct InstallPipeline<'a> {
    runner: &'a dyn CommandRunner,
    caps: HostCapabilities,
    downloader: &'a Downloader,
    options: InstallOptions,
    probe: Option<ProbeContext<'a>>,
    backend: Option<Box<dyn SchedulerBackend + 'a>>,
    profile_dir: PathBuf,
    lock_dir: PathBuf,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        caps: HostCapabilities,
        downloader: &'a Downloader,
        options: InstallOptions,
    ) -> Self {
        Self {
            runner,
            caps,
            downloader,
            options,
            probe: None,
            backend: None,
            profile_dir: PathBuf::from(PROFILE_DIR),
            lock_dir: PathBuf::from(LOCK_DIR),
        }
    }

    /// Search these locations instead of the host's.
    pub fn with_probe_context(mut self, ctx: ProbeContext<'a>) -> Self {
        self.probe = Some(ctx);
        self
    }

    /// Register jobs through `backend` instead of the detected scheduler.
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

    /// Install `config` onto the host.
    pub fn run(self, config: &DesiredConfig, ui: &mut dyn UserInterface) -> Result<InstallReport> {
        let platform = self.caps.platform;
        ui.show_header(&format!("Installing {}", config.command_name));

        // 1. Everything that can fail without side effects.
        ui.show_progress(1, INSTALL_STEPS, "Checking host");
        let schedule = ScheduleSpec::compute(config.logs_per_hour, config.safety_margin_sec)?;
        let floor: RuntimeVersion =
            config
                .min_runtime_version
                .parse()
                .map_err(|message| SetupError::InvalidConfig { message })?;
        if !self.caps.elevated {
            return Err(SetupError::ElevationRequired {
                message: if platform.is_windows() {
                    "run from an Administrator prompt".to_string()
                } else {
                    "run as root (for example with sudo)".to_string()
                },
            });
        }
        debug!(
            "schedule: every {} min, {}s per run",
            schedule.step_minutes, schedule.duration_seconds
        );
        let mut state = InstallationState::load_or_new(platform, &config.install_root)?;
        state.schedule = Some(schedule.clone());
        state.log_dir = Some(config.log_dir.clone());

        // 2. Runtime.
        ui.show_progress(2, INSTALL_STEPS, "Resolving Python runtime");
        if platform.is_windows() {
            if let Some(dir) = windows_apps_dir() {
                for alias in remove_stubs(&dir) {
                    info!("Removed app-execution alias {}", alias.display());
                }
            }
        }
        let ctx = match self.probe {
            Some(ctx) => ctx,
            None => ProbeContext::for_host(self.runner, platform, &config.install_root),
        };
        let resolver = RuntimeResolver::new(ctx, floor);
        let installer = RuntimeInstaller::new(
            self.runner,
            self.downloader,
            platform,
            self.caps.package_manager,
            config.install_root.join("downloads"),
            config.runtime_dir(),
        );
        let runtime = resolve_or_install(
            &resolver,
            self.options.allow_runtime_install.then_some(&installer),
        )?;
        let version = runtime.version.map(|v| v.to_string()).unwrap_or_default();
        ui.message(&format!(
            "Using Python {} at {} ({})",
            version,
            runtime.path.display(),
            runtime.source
        ));
        state.runtime_exe = Some(runtime.path.clone());
        state.runtime_version = runtime.version.map(|v| v.to_string());
        state.save()?;

        // 3. Source.
        ui.show_progress(3, INSTALL_STEPS, "Syncing repository");
        let synced = RepoSynchronizer::new(self.runner, self.downloader, self.caps.git_available)
            .sync(
                &config.repo_url,
                &config.branch,
                &config.src_dir(),
                &config.manifest_marker,
            )?;
        if let Some(commit) = &synced.commit {
            ui.message(&format!("{} @ {}", config.branch, short_sha(commit)));
        }
        state.src_path = Some(synced.path.clone());
        state.commit = synced.commit.clone();
        state.save()?;

        // 4. Environment.
        ui.show_progress(4, INSTALL_STEPS, "Preparing environment");
        let provisioner =
            EnvironmentProvisioner::new(self.runner, platform).with_bundle_bootstrap(&installer);
        let env = provisioner.prepare(&runtime, &config.venv_dir(), &config.runtime_dir())?;
        state.env_kind = Some(env.kind);
        state.env_path = Some(env.root.clone());
        state.save()?;

        // 5. Package.
        ui.show_progress(5, INSTALL_STEPS, "Installing package");
        let mut spinner = ui.start_spinner(&format!("pip install -e {}", synced.path.display()));
        match provisioner.install_package(&env, &synced.path) {
            Ok(()) => spinner.finish_success("Package installed"),
            Err(err) => {
                spinner.finish_error("Package install failed");
                return Err(err);
            }
        }

        // 6. Entry points.
        ui.show_progress(6, INSTALL_STEPS, "Publishing entry points");
        fs::create_dir_all(&config.log_dir)?;
        let job_names = vec![LOGGER_JOB.to_string(), ARCHIVER_JOB.to_string()];
        let published = EntryPointPublisher::new(self.runner, platform)
            .with_profile_dir(&self.profile_dir)
            .with_lock_dir(&self.lock_dir)
            .publish(config, &env.python, &job_names)?;
        state.wrapper_path = Some(published.wrapper.clone());
        state.uninstall_path = Some(published.uninstall.clone());
        state.path_entry = Some(published.path_entry.clone());
        state.save()?;
        if published.path_changed {
            ui.message(&format!(
                "{} added to PATH; open a new shell to pick it up",
                config.bin_dir.display()
            ));
        }

        // 7. Jobs.
        ui.show_progress(7, INSTALL_STEPS, "Registering scheduled jobs");
        let backend = match self.backend {
            Some(backend) => backend,
            None => backend_for(self.caps.scheduler, self.runner, &config.jobs_dir())?,
        };
        let registrar = JobRegistrar::new(backend.as_ref());
        let jobs = [
            JobDescriptor::logger(config, &env.python, &schedule),
            JobDescriptor::archiver(config, &env.python),
        ];
        for job in &jobs {
            registrar.register(job)?;
            state.record_job(&job.name);
            state.save()?;
        }
        ui.message(&format!(
            "{} at minutes {} past each hour, {}s per run",
            LOGGER_JOB,
            schedule.minute_field(),
            schedule.duration_seconds
        ));

        // 8. Trial run.
        ui.show_progress(8, INSTALL_STEPS, "Self-test");
        let self_test_passed = if self.options.skip_self_test {
            ui.message("Self-test skipped");
            None
        } else {
            match run_self_test(self.runner, &published.wrapper, &config.target) {
                Ok(()) => {
                    ui.success("Self-test passed");
                    Some(true)
                }
                Err(err) => {
                    ui.warning(&err.to_string());
                    Some(false)
                }
            }
        };

        ui.success(&format!(
            "{} installed; run '{} uninstall' to remove it",
            config.command_name, config.command_name
        ));
        Ok(InstallReport {
            state,
            schedule,
            self_test_passed,
        })
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::CrontabBackend;
    use crate::runtime::testutil::fake_exe;
    use crate::shell::{MockResponse, MockRunner, Platform};
    use crate::ui::MockUI;
    use std::path::Path;
    use tempfile::TempDir;

    fn caps(elevated: bool) -> HostCapabilities {
        HostCapabilities {
            platform: Platform::Linux,
            elevated,
            package_manager: None,
            scheduler: Some(crate::host::SchedulerFamily::Cron),
            git_available: true,
            tar_available: true,
        }
    }

    fn config(temp: &TempDir) -> DesiredConfig {
        DesiredConfig {
            install_root: temp.path().join("opt"),
            bin_dir: temp.path().join("bin"),
            log_dir: temp.path().join("logs"),
            ..DesiredConfig::for_platform(Platform::Linux)
        }
    }

    #[test]
    fn invalid_schedule_fails_before_any_host_access() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let downloader = Downloader::new();
        let mut ui = MockUI::new();
        let config = DesiredConfig {
            logs_per_hour: 7,
            ..config(&temp)
        };

        let err = InstallPipeline::new(&runner, caps(false), &downloader, InstallOptions::default())
            .run(&config, &mut ui)
            .unwrap_err();

        assert!(matches!(err, SetupError::ScheduleInvalid { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(runner.calls().is_empty());
        assert!(!config.install_root.exists());
    }

    #[test]
    fn missing_elevation_is_fatal_before_mutation() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let downloader = Downloader::new();
        let mut ui = MockUI::new();

        let err = InstallPipeline::new(&runner, caps(false), &downloader, InstallOptions::default())
            .run(&config(&temp), &mut ui)
            .unwrap_err();

        assert!(matches!(err, SetupError::ElevationRequired { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(runner.calls().is_empty());
        assert_eq!(ui.progress().len(), 1);
    }

    #[test]
    fn bad_version_floor_is_invalid_config() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let downloader = Downloader::new();
        let mut ui = MockUI::new();
        let config = DesiredConfig {
            min_runtime_version: "three".to_string(),
            ..config(&temp)
        };

        let err = InstallPipeline::new(&runner, caps(true), &downloader, InstallOptions::default())
            .run(&config, &mut ui)
            .unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig { .. }));
    }

    /// Script a host where every step succeeds.
    fn happy_host(temp: &TempDir, config: &DesiredConfig) -> (MockRunner, PathBuf) {
        let bin = temp.path().join("usr-bin");
        fs::create_dir_all(&bin).unwrap();
        let python = fake_exe(&bin, "python3");
        let venv_python = config.venv_dir().join("bin").join("python");

        let runner = MockRunner::new();
        runner.on(&format!("{} --version", python.display()), MockResponse::ok("Python 3.11.4\n"));

        let src = config.src_dir();
        let marker = config.manifest_marker.clone();
        runner.on_with("git clone", move |_| {
            fs::create_dir_all(src.join(".git")).unwrap();
            fs::write(src.join(&marker), "[project]\n").unwrap();
            MockResponse::ok("")
        });
        runner.on("git rev-parse HEAD", MockResponse::ok("0123456789abcdef0123\n"));

        let created = venv_python.clone();
        runner.on_with(&format!("{} -m venv", python.display()), move |_| {
            fs::create_dir_all(created.parent().unwrap()).unwrap();
            fs::write(&created, "").unwrap();
            MockResponse::ok("")
        });
        runner.on(&venv_python.display().to_string(), MockResponse::ok("pip 24.0"));
        runner.on("crontab -", MockResponse::ok(""));
        runner.on("crontab -l", MockResponse::fail(1, "no crontab for root"));
        (runner, python)
    }

    fn probe<'a>(runner: &'a MockRunner, python: &Path) -> ProbeContext<'a> {
        ProbeContext {
            runner,
            platform: Platform::Linux,
            path_dirs: Vec::new(),
            known_locations: vec![python.to_path_buf()],
            scan_roots: Vec::new(),
        }
    }

    #[test]
    fn full_install_reports_eight_steps_and_saves_state() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let (runner, python) = happy_host(&temp, &config);
        let downloader = Downloader::new();
        let mut ui = MockUI::new();

        let report = InstallPipeline::new(
            &runner,
            caps(true),
            &downloader,
            InstallOptions {
                allow_runtime_install: false,
                skip_self_test: true,
            },
        )
        .with_probe_context(probe(&runner, &python))
        .with_scheduler(Box::new(CrontabBackend::new(&runner)))
        .with_profile_dir(temp.path().join("profile.d"))
        .run(&config, &mut ui)
        .unwrap();

        let steps: Vec<usize> = ui.progress().iter().map(|(n, _, _)| *n).collect();
        assert_eq!(steps, (1..=8).collect::<Vec<_>>());
        assert!(ui.progress().iter().all(|(_, total, _)| *total == INSTALL_STEPS));

        assert_eq!(report.schedule.duration_seconds, 895);
        assert_eq!(report.self_test_passed, None);
        assert_eq!(report.state.runtime_version.as_deref(), Some("3.11.4"));
        assert_eq!(report.state.commit.as_deref(), Some("0123456789abcdef0123"));
        assert_eq!(
            report.state.registered_jobs,
            vec!["mtr-logger", "mtr-logger-archiver"]
        );

        let saved = InstallationState::load(&config.state_file()).unwrap().unwrap();
        assert_eq!(saved.registered_jobs.len(), 2);
        assert!(config.bin_dir.join("mtr-logger").is_file());
        assert!(config.log_dir.is_dir());

        let crontab_writes: Vec<_> = runner
            .calls()
            .into_iter()
            .filter(|c| c.program == "crontab" && c.args == ["-"])
            .collect();
        assert_eq!(crontab_writes.len(), 2);
        let logger_table = crontab_writes[0].options.stdin.clone().unwrap();
        assert!(logger_table.starts_with("0,15,30,45 * * * * flock -n /var/lock/mtr-logger.lock"));
    }

    #[test]
    fn missing_manifest_aborts_before_environment() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let (runner, python) = happy_host(&temp, &config);
        let src = config.src_dir();
        runner.on_with("git clone", move |_| {
            fs::create_dir_all(src.join(".git")).unwrap();
            MockResponse::ok("")
        });
        let downloader = Downloader::new();
        let mut ui = MockUI::new();

        let err = InstallPipeline::new(&runner, caps(true), &downloader, InstallOptions::default())
            .with_probe_context(probe(&runner, &python))
            .run(&config, &mut ui)
            .unwrap_err();

        assert!(matches!(err, SetupError::ManifestMissing { .. }));
        assert!(!runner.was_called(&format!("{} -m venv", python.display())));
        let saved = InstallationState::load(&config.state_file()).unwrap().unwrap();
        assert_eq!(saved.runtime_version.as_deref(), Some("3.11.4"));
        assert!(saved.src_path.is_none());
    }

    #[test]
    fn failed_self_test_is_only_a_warning() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let (runner, python) = happy_host(&temp, &config);
        runner.on(
            &config.bin_dir.join("mtr-logger").display().to_string(),
            MockResponse::fail(1, "Operation not permitted"),
        );
        let downloader = Downloader::new();
        let mut ui = MockUI::new();

        let report = InstallPipeline::new(&runner, caps(true), &downloader, InstallOptions::default())
            .with_probe_context(probe(&runner, &python))
            .with_scheduler(Box::new(CrontabBackend::new(&runner)))
            .with_profile_dir(temp.path().join("profile.d"))
            .run(&config, &mut ui)
            .unwrap();

        assert_eq!(report.self_test_passed, Some(false));
        assert!(ui.has_warning("Operation not permitted"));
    }

    #[test]
    fn no_scheduler_fails_after_publishing() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let (runner, python) = happy_host(&temp, &config);
        let downloader = Downloader::new();
        let mut ui = MockUI::new();
        let caps = HostCapabilities {
            scheduler: None,
            ..caps(true)
        };

        let err = InstallPipeline::new(&runner, caps, &downloader, InstallOptions::default())
            .with_probe_context(probe(&runner, &python))
            .with_profile_dir(temp.path().join("profile.d"))
            .run(&config, &mut ui)
            .unwrap_err();

        assert!(matches!(err, SetupError::SchedulerUnavailable { .. }));
        // earlier steps stay in place
        assert!(config.bin_dir.join("mtr-logger").is_file());
    }
}
