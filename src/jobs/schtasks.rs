//! Windows Task Scheduler encoder and backend.
//!
//! Each job gets a PowerShell script that takes a `Global\<name>` mutex with
//! a zero wait before running, so a firing that overlaps the previous run
//! exits instead of queuing. The task itself only runs that script, which
//! keeps argument quoting out of the `/TR` string.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::descriptor::{JobDescriptor, PrivilegeLevel, Recurrence};
use super::registrar::SchedulerBackend;
use crate::error::Result;
use crate::host::SchedulerFamily;
use crate::shell::{run_checked, CommandRunner, Invocation};

/// Task folder holding every managed task.
pub const TASK_FOLDER: &str = r"\MTR\";

/// Full task name for `name`.
pub fn task_name(name: &str) -> String {
    format!("{TASK_FOLDER}{name}")
}

/// Single-quoted PowerShell literal.
pub fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Script path for `name` under `scripts_dir`.
pub fn script_path(scripts_dir: &Path, name: &str) -> PathBuf {
    scripts_dir.join(format!("{name}.ps1"))
}

/// PowerShell body for `job`.
pub fn render_script(job: &JobDescriptor) -> String {
    let mut command = vec![format!("& {}", ps_quote(&job.program.display().to_string()))];
    command.extend(job.args.iter().map(|a| ps_quote(a)));
    let log = ps_quote(&job.log_file.display().to_string());
    let mutex = ps_quote(&format!(r"Global\{}", job.name));

    format!(
        "$mutex = New-Object System.Threading.Mutex($false, {mutex})\r\n\
         if (-not $mutex.WaitOne(0)) {{ exit 0 }}\r\n\
         try {{\r\n\
         \x20   {cmd} *>> {log}\r\n\
         \x20   exit $LASTEXITCODE\r\n\
         }} finally {{\r\n\
         \x20   $mutex.ReleaseMutex()\r\n\
         \x20   $mutex.Dispose()\r\n\
         }}\r\n",
        cmd = command.join(" "),
    )
}

/// `/TR` value running `script`.
pub fn task_command(script: &Path) -> String {
    format!(
        "powershell.exe -NoProfile -NonInteractive -ExecutionPolicy Bypass -File \"{}\"",
        script.display()
    )
}

/// Trigger arguments for a recurrence.
pub fn trigger_args(recurrence: &Recurrence) -> Vec<String> {
    // interval triggers start at 00:00 so they fire on the minute marks
    match recurrence {
        Recurrence::EveryMinutes { step: 60, .. } => {
            ["/SC", "HOURLY", "/ST", "00:00"].map(String::from).to_vec()
        }
        Recurrence::EveryMinutes { step, .. } => vec![
            "/SC".to_string(),
            "MINUTE".to_string(),
            "/MO".to_string(),
            step.to_string(),
            "/ST".to_string(),
            "00:00".to_string(),
        ],
        Recurrence::DailyAt { hour } => vec![
            "/SC".to_string(),
            "DAILY".to_string(),
            "/ST".to_string(),
            format!("{hour:02}:00"),
        ],
    }
}

/// Full `schtasks /Create` argument list.
pub fn create_args(job: &JobDescriptor, script: &Path) -> Vec<String> {
    let mut args = vec![
        "/Create".to_string(),
        "/TN".to_string(),
        task_name(&job.name),
        "/TR".to_string(),
        task_command(script),
    ];
    args.extend(trigger_args(&job.recurrence));
    match job.privilege {
        PrivilegeLevel::Highest => {
            args.extend(["/RU", "SYSTEM", "/RL", "HIGHEST"].map(String::from));
        }
        PrivilegeLevel::Standard => {
            args.extend(["/RL", "LIMITED"].map(String::from));
        }
    }
    args.push("/F".to_string());
    args
}

/// Task Scheduler reached through `schtasks.exe`.
pub struct TaskSchedulerBackend<'a> {
    runner: &'a dyn CommandRunner,
    scripts_dir: PathBuf,
}

impl<'a> TaskSchedulerBackend<'a> {
    pub fn new(runner: &'a dyn CommandRunner, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            scripts_dir: scripts_dir.into(),
        }
    }
}

impl SchedulerBackend for TaskSchedulerBackend<'_> {
    fn family(&self) -> SchedulerFamily {
        SchedulerFamily::TaskScheduler
    }

    fn query(&self, name: &str) -> Result<Option<String>> {
        let inv = Invocation::new("schtasks").args(["/Query", "/TN", &task_name(name)]);
        let result = self.runner.run(&inv)?;
        Ok(result.success.then_some(result.stdout))
    }

    fn remove(&self, name: &str) -> Result<()> {
        if self.query(name)?.is_none() {
            debug!("no scheduled task {}", task_name(name));
            return Ok(());
        }
        let inv = Invocation::new("schtasks").args(["/Delete", "/TN", &task_name(name), "/F"]);
        run_checked(self.runner, &inv)?;
        info!("Removed scheduled task {}", task_name(name));
        Ok(())
    }

    fn create(&self, job: &JobDescriptor) -> Result<()> {
        fs::create_dir_all(&self.scripts_dir)?;
        let script = script_path(&self.scripts_dir, &job.name);
        fs::write(&script, render_script(job))?;

        let inv = Invocation::new("schtasks").args(create_args(job, &script));
        run_checked(self.runner, &inv)?;
        info!("Registered scheduled task {}", task_name(&job.name));
        Ok(())
    }

    fn render(&self, job: &JobDescriptor) -> Result<String> {
        let script = script_path(&self.scripts_dir, &job.name);
        Ok(Invocation::new("schtasks")
            .args(create_args(job, &script))
            .display())
    }
}
