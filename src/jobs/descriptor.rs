//! Typed scheduler jobs.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{BorderStyle, DesiredConfig};
use crate::schedule::ScheduleSpec;

/// Name of the recurring logger job.
pub const LOGGER_JOB: &str = "mtr-logger";
/// Name of the daily archiver job.
pub const ARCHIVER_JOB: &str = "mtr-logger-archiver";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    RecurringLogger,
    DailyArchiver,
}

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Recurrence {
    /// At each of `marks` past every hour; `step` minutes apart.
    EveryMinutes { step: u32, marks: Vec<u32> },
    /// Once a day at `hour:00`.
    DailyAt { hour: u32 },
}

/// Account the job runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeLevel {
    /// The most privileged non-interactive account (root, SYSTEM).
    Highest,
    /// The registering user, without elevation.
    Standard,
}

/// One job for the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    pub name: String,
    pub kind: JobKind,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub recurrence: Recurrence,
    pub privilege: PrivilegeLevel,
    /// Append-only log receiving the job's output.
    pub log_file: PathBuf,
}

impl JobDescriptor {
    /// The logger job: probe for `duration_seconds` at each minute mark.
    pub fn logger(config: &DesiredConfig, python: &Path, spec: &ScheduleSpec) -> Self {
        Self {
            name: LOGGER_JOB.to_string(),
            kind: JobKind::RecurringLogger,
            program: python.to_path_buf(),
            args: logger_args(config, spec.duration_seconds),
            recurrence: Recurrence::EveryMinutes {
                step: spec.step_minutes,
                marks: spec.minute_marks.clone(),
            },
            privilege: PrivilegeLevel::Highest,
            log_file: job_log(&config.log_dir, LOGGER_JOB),
        }
    }

    /// The archiver job: prune reports once a day.
    pub fn archiver(config: &DesiredConfig, python: &Path) -> Self {
        Self {
            name: ARCHIVER_JOB.to_string(),
            kind: JobKind::DailyArchiver,
            program: python.to_path_buf(),
            args: vec![
                "-m".to_string(),
                config.archiver_module.clone(),
                "--retention".to_string(),
                config.archive_retention_days.to_string(),
                "--log-dir".to_string(),
                config.log_dir.display().to_string(),
            ],
            recurrence: Recurrence::DailyAt {
                hour: config.archive_hour,
            },
            privilege: PrivilegeLevel::Highest,
            log_file: job_log(&config.log_dir, ARCHIVER_JOB),
        }
    }

    /// Program and arguments as one argv.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// `<log_dir>/<name>.cron.log`
pub fn job_log(log_dir: &Path, name: &str) -> PathBuf {
    log_dir.join(format!("{name}.cron.log"))
}

/// Arguments for one bounded, non-interactive logger run.
pub fn logger_args(config: &DesiredConfig, duration_seconds: u32) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        config.package_module.clone(),
        config.target.clone(),
        "--proto".to_string(),
        config.proto.to_string(),
        "--dns".to_string(),
        config.dns.to_string(),
        "--interval".to_string(),
        config.interval.to_string(),
        "--timeout".to_string(),
        config.timeout.to_string(),
        "--probes".to_string(),
        config.probes.to_string(),
    ];
    if config.border_style == BorderStyle::Ascii {
        args.push("--ascii".to_string());
    }
    args.extend(
        [
            "--no-screen",
            "--duration",
            &duration_seconds.to_string(),
            "--export",
            "--outfile",
            "auto",
            "--log-dir",
            &config.log_dir.display().to_string(),
        ]
        .map(String::from),
    );
    args
}
