//! crontab encoder and backend.
//!
//! Every entry carries a trailing `# mtr-setup:<name>` marker; replacing a
//! job means dropping every line with its marker before appending.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::descriptor::{JobDescriptor, Recurrence};
use super::registrar::SchedulerBackend;
use crate::error::{Result, SetupError};
use crate::host::SchedulerFamily;
use crate::shell::{run_checked, CommandRunner, Invocation};

/// Prefix of the marker comment ending every managed line.
pub const MARKER_PREFIX: &str = "# mtr-setup:";

/// Directory holding the per-job `flock` files.
pub const LOCK_DIR: &str = "/var/lock";

/// Marker comment for `name`.
pub fn marker(name: &str) -> String {
    format!("{MARKER_PREFIX}{name}")
}

/// Lock file serializing runs of `name`.
pub fn lock_file(lock_dir: &Path, name: &str) -> PathBuf {
    lock_dir.join(format!("{name}.lock"))
}

/// The five schedule fields for a recurrence.
pub fn schedule_fields(recurrence: &Recurrence) -> String {
    match recurrence {
        Recurrence::EveryMinutes { marks, .. } => {
            let minutes = marks
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("{minutes} * * * *")
        }
        Recurrence::DailyAt { hour } => format!("0 {hour} * * *"),
    }
}

/// cron turns a bare `%` into a newline even inside shell quotes.
fn escape_percent(text: &str) -> String {
    text.replace('%', "\\%")
}

/// One crontab line for `job`.
///
/// The command runs under `flock -n`, so a firing that finds the previous
/// run still holding the lock exits at once.
pub fn render_entry(job: &JobDescriptor, lock_dir: &Path) -> String {
    let lock = lock_file(lock_dir, &job.name).display().to_string();
    let mut words = vec!["flock".to_string(), "-n".to_string(), lock];
    words.extend(job.argv());
    let command = escape_percent(&shell_words::join(&words));
    let log = job.log_file.display().to_string();

    format!(
        "{} {} >> {} 2>&1 {}",
        schedule_fields(&job.recurrence),
        command,
        escape_percent(&shell_words::quote(&log)),
        marker(&job.name)
    )
}

fn is_managed_line(line: &str, name: &str) -> bool {
    line.trim_end().ends_with(&marker(name))
}

/// `table` without the lines belonging to `name`.
pub fn filter_table(table: &str, name: &str) -> String {
    let mut out = String::new();
    for line in table.lines().filter(|line| !is_managed_line(line, name)) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// `table` with `name`'s lines replaced by `entry`.
pub fn replace_entry(table: &str, name: &str, entry: &str) -> String {
    let mut out = filter_table(table, name);
    out.push_str(entry);
    out.push('\n');
    out
}

/// The invoking user's crontab, reached through the `crontab` binary.
pub struct CrontabBackend<'a> {
    runner: &'a dyn CommandRunner,
    lock_dir: PathBuf,
}

impl<'a> CrontabBackend<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            lock_dir: PathBuf::from(LOCK_DIR),
        }
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    /// Current table; an absent crontab reads as empty.
    pub fn read_table(&self) -> Result<String> {
        let list = Invocation::new("crontab").arg("-l");
        let result = self.runner.run(&list)?;
        if result.success {
            return Ok(result.stdout);
        }
        if result.stderr.to_lowercase().contains("no crontab") {
            debug!("no crontab for current user yet");
            return Ok(String::new());
        }
        Err(SetupError::CommandFailed {
            command: list.display(),
            code: result.exit_code,
            output_tail: result.output_tail(),
        })
    }

    fn write_table(&self, table: &str) -> Result<()> {
        run_checked(self.runner, &Invocation::new("crontab").arg("-").stdin(table))?;
        Ok(())
    }
}

impl SchedulerBackend for CrontabBackend<'_> {
    fn family(&self) -> SchedulerFamily {
        SchedulerFamily::Cron
    }

    fn query(&self, name: &str) -> Result<Option<String>> {
        let table = self.read_table()?;
        Ok(table
            .lines()
            .find(|line| is_managed_line(line, name))
            .map(str::to_string))
    }

    fn remove(&self, name: &str) -> Result<()> {
        let table = self.read_table()?;
        let filtered = filter_table(&table, name);
        if filtered.lines().count() == table.lines().count() {
            debug!("no crontab entry for {name}");
            return Ok(());
        }
        self.write_table(&filtered)?;
        info!("Removed crontab entry {name}");
        Ok(())
    }

    fn create(&self, job: &JobDescriptor) -> Result<()> {
        let table = self.read_table()?;
        let entry = render_entry(job, &self.lock_dir);
        self.write_table(&replace_entry(&table, &job.name, &entry))?;
        info!("Registered crontab entry {}", job.name);
        Ok(())
    }

    fn render(&self, job: &JobDescriptor) -> Result<String> {
        Ok(render_entry(job, &self.lock_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesiredConfig;
    use crate::jobs::descriptor::{JobKind, PrivilegeLevel};
    use crate::schedule::ScheduleSpec;
    use crate::shell::{MockResponse, MockRunner, Platform};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn logger_job() -> JobDescriptor {
        let config = DesiredConfig {
            log_dir: PathBuf::from("/root/mtr/logs"),
            ..DesiredConfig::for_platform(Platform::Linux)
        };
        let spec = ScheduleSpec::compute(4, 5).unwrap();
        JobDescriptor::logger(&config, Path::new("/opt/mtr-logger/venv/bin/python"), &spec)
    }

    #[test]
    fn renders_logger_entry_exactly() {
        assert_eq!(
            render_entry(&logger_job(), Path::new(LOCK_DIR)),
            "0,15,30,45 * * * * flock -n /var/lock/mtr-logger.lock \
             /opt/mtr-logger/venv/bin/python -m mtrpy 8.8.8.8 --proto icmp --dns auto \
             --interval 1 --timeout 5 --probes 3 --ascii --no-screen --duration 895 \
             --export --outfile auto --log-dir /root/mtr/logs \
             >> /root/mtr/logs/mtr-logger.cron.log 2>&1 # mtr-setup:mtr-logger"
        );
    }

    #[test]
    fn renders_daily_entry() {
        let job = JobDescriptor {
            name: "mtr-logger-archiver".to_string(),
            kind: JobKind::DailyArchiver,
            program: PathBuf::from("/venv/bin/python"),
            args: vec!["-m".into(), "mtrpy.archiver".into()],
            recurrence: Recurrence::DailyAt { hour: 3 },
            privilege: PrivilegeLevel::Highest,
            log_file: PathBuf::from("/var/log/archiver.log"),
        };
        assert_eq!(
            render_entry(&job, Path::new("/run/lock")),
            "0 3 * * * flock -n /run/lock/mtr-logger-archiver.lock /venv/bin/python -m mtrpy.archiver \
             >> /var/log/archiver.log 2>&1 # mtr-setup:mtr-logger-archiver"
        );
    }

    #[test]
    fn quotes_arguments_with_spaces() {
        let mut job = logger_job();
        job.args = vec!["-m".into(), "mtrpy".into(), "my host".into()];
        job.log_file = PathBuf::from("/tmp/log dir/x.log");
        let entry = render_entry(&job, Path::new(LOCK_DIR));
        assert!(entry.contains("'my host'"));
        assert!(entry.contains(">> '/tmp/log dir/x.log' 2>&1"));
    }

    #[test]
    fn escapes_percent_signs_for_cron() {
        let config = DesiredConfig {
            target: "fe80::1%eth0".to_string(),
            log_dir: PathBuf::from("/srv/logs/100%"),
            ..DesiredConfig::for_platform(Platform::Linux)
        };
        let spec = ScheduleSpec::compute(4, 5).unwrap();
        let job =
            JobDescriptor::logger(&config, Path::new("/opt/mtr-logger/venv/bin/python"), &spec);
        let entry = render_entry(&job, Path::new(LOCK_DIR));

        assert!(entry.contains(" -m mtrpy 'fe80::1\\%eth0' "));
        assert!(entry.contains("--log-dir '/srv/logs/100\\%'"));
        assert!(entry.contains(">> '/srv/logs/100\\%/mtr-logger.cron.log' 2>&1"));
        assert_eq!(entry.matches('%').count(), entry.matches("\\%").count());
    }

    #[test]
    fn filtering_keeps_foreign_and_sibling_lines() {
        let table = "MAILTO=root\n\
                     5 * * * * /usr/bin/backup\n\
                     0 * * * * old # mtr-setup:mtr-logger\n\
                     0 0 * * * arch # mtr-setup:mtr-logger-archiver\n";
        let filtered = filter_table(table, "mtr-logger");
        assert_eq!(
            filtered,
            "MAILTO=root\n5 * * * * /usr/bin/backup\n0 0 * * * arch # mtr-setup:mtr-logger-archiver\n"
        );
    }

    #[test]
    fn replacing_twice_leaves_one_entry() {
        let once = replace_entry("", "mtr-logger", "a # mtr-setup:mtr-logger");
        let twice = replace_entry(&once, "mtr-logger", "b # mtr-setup:mtr-logger");
        assert_eq!(twice, "b # mtr-setup:mtr-logger\n");
    }

    /// A runner whose crontab persists between calls.
    fn crontab_runner(initial: &str) -> (MockRunner, Rc<RefCell<String>>) {
        let table = Rc::new(RefCell::new(initial.to_string()));
        let runner = MockRunner::new();
        let write = Rc::clone(&table);
        runner.on_with("crontab -", move |inv| {
            *write.borrow_mut() = inv.options.stdin.clone().unwrap_or_default();
            MockResponse::ok("")
        });
        // registered last so it wins over the "crontab -" prefix
        let read = Rc::clone(&table);
        runner.on_with("crontab -l", move |_| {
            let table = read.borrow();
            if table.is_empty() {
                MockResponse::fail(1, "no crontab for root")
            } else {
                MockResponse::ok(&table)
            }
        });
        (runner, table)
    }

    #[test]
    fn backend_create_is_idempotent() {
        let (runner, table) = crontab_runner("5 * * * * /usr/bin/backup\n");
        let backend = CrontabBackend::new(&runner).with_lock_dir("/run/lock");
        let job = logger_job();

        backend.create(&job).unwrap();
        backend.create(&job).unwrap();

        let table = table.borrow();
        assert_eq!(table.matches("# mtr-setup:mtr-logger").count(), 1);
        assert!(table.contains("flock -n /run/lock/mtr-logger.lock"));
        assert!(table.starts_with("5 * * * * /usr/bin/backup\n"));
        assert!(backend.query("mtr-logger").unwrap().is_some());
    }

    #[test]
    fn backend_treats_missing_crontab_as_empty() {
        let (runner, _) = crontab_runner("");
        let backend = CrontabBackend::new(&runner);
        assert_eq!(backend.read_table().unwrap(), "");
        assert_eq!(backend.query("mtr-logger").unwrap(), None);
        backend.remove("mtr-logger").unwrap();
        assert!(!runner.call_lines().contains(&"crontab -".to_string()));
    }

    #[test]
    fn backend_remove_drops_entry() {
        let (runner, table) = crontab_runner("x # mtr-setup:mtr-logger\ny\n");
        CrontabBackend::new(&runner).remove("mtr-logger").unwrap();
        assert_eq!(*table.borrow(), "y\n");
    }

    #[test]
    fn unreadable_crontab_is_an_error() {
        let runner = MockRunner::new();
        runner.on("crontab -l", MockResponse::fail(1, "crontab: permission denied"));
        let err = CrontabBackend::new(&runner).read_table().unwrap_err();
        assert_eq!(err.diagnostic_tail(), Some("crontab: permission denied"));
    }
}
