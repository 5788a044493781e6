//! Idempotent job registration.

use std::path::Path;

use tracing::info;

use super::cron::CrontabBackend;
use super::descriptor::JobDescriptor;
use super::schtasks::TaskSchedulerBackend;
use crate::error::{Result, SetupError};
use crate::host::SchedulerFamily;
use crate::shell::CommandRunner;

/// Capability interface over the host's job table.
pub trait SchedulerBackend {
    /// Which scheduler this is.
    fn family(&self) -> SchedulerFamily;

    /// The registered entry for `name`, if any.
    fn query(&self, name: &str) -> Result<Option<String>>;

    /// Remove `name`. A missing entry is not an error.
    fn remove(&self, name: &str) -> Result<()>;

    /// Add an entry for `job`.
    fn create(&self, job: &JobDescriptor) -> Result<()>;

    /// What [`create`](Self::create) would register, without touching the host.
    fn render(&self, job: &JobDescriptor) -> Result<String>;
}

/// Backend for the detected scheduler family.
///
/// `jobs_dir` receives per-job scripts where the scheduler needs them.
pub fn backend_for<'a>(
    family: Option<SchedulerFamily>,
    runner: &'a dyn CommandRunner,
    jobs_dir: &Path,
) -> Result<Box<dyn SchedulerBackend + 'a>> {
    match family {
        Some(SchedulerFamily::Cron) => Ok(Box::new(CrontabBackend::new(runner))),
        Some(SchedulerFamily::TaskScheduler) => {
            Ok(Box::new(TaskSchedulerBackend::new(runner, jobs_dir)))
        }
        None => Err(SetupError::SchedulerUnavailable {
            message: "no usable scheduler on PATH (need crontab and flock, or schtasks)".to_string(),
        }),
    }
}

/// Registers jobs so each name has exactly one active entry.
pub struct JobRegistrar<'a> {
    backend: &'a dyn SchedulerBackend,
}

impl<'a> JobRegistrar<'a> {
    pub fn new(backend: &'a dyn SchedulerBackend) -> Self {
        Self { backend }
    }

    /// Delete any entry named like `job`, then create it.
    pub fn register(&self, job: &JobDescriptor) -> Result<()> {
        self.backend.remove(&job.name)?;
        self.backend.create(job)?;
        info!("Job {} registered with {:?}", job.name, self.backend.family());
        Ok(())
    }

    /// Register every job in order; returns the registered names.
    pub fn register_all(&self, jobs: &[JobDescriptor]) -> Result<Vec<String>> {
        jobs.iter()
            .map(|job| self.register(job).map(|_| job.name.clone()))
            .collect()
    }

    /// Remove every named job.
    pub fn unregister(&self, names: &[String]) -> Result<()> {
        for name in names {
            self.backend.remove(name)?;
        }
        Ok(())
    }

    /// Whether each named job is present.
    pub fn status(&self, names: &[String]) -> Result<Vec<(String, bool)>> {
        names
            .iter()
            .map(|name| Ok((name.clone(), self.backend.query(name)?.is_some())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesiredConfig;
    use crate::schedule::ScheduleSpec;
    use crate::shell::{MockRunner, Platform};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory job table that allows duplicate names, so a registrar that
    /// forgot to delete first would be caught.
    #[derive(Default)]
    struct FakeBackend {
        entries: RefCell<Vec<(String, String)>>,
        ops: RefCell<Vec<String>>,
    }

    impl FakeBackend {
        fn count(&self, name: &str) -> usize {
            self.entries.borrow().iter().filter(|(n, _)| n == name).count()
        }
    }

    impl SchedulerBackend for FakeBackend {
        fn family(&self) -> SchedulerFamily {
            SchedulerFamily::Cron
        }

        fn query(&self, name: &str) -> Result<Option<String>> {
            Ok(self
                .entries
                .borrow()
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, e)| e.clone()))
        }

        fn remove(&self, name: &str) -> Result<()> {
            self.ops.borrow_mut().push(format!("remove {name}"));
            self.entries.borrow_mut().retain(|(n, _)| n != name);
            Ok(())
        }

        fn create(&self, job: &JobDescriptor) -> Result<()> {
            self.ops.borrow_mut().push(format!("create {}", job.name));
            self.entries
                .borrow_mut()
                .push((job.name.clone(), self.render(job)?));
            Ok(())
        }

        fn render(&self, job: &JobDescriptor) -> Result<String> {
            Ok(job.argv().join(" "))
        }
    }

    fn jobs() -> Vec<JobDescriptor> {
        let config = DesiredConfig::for_platform(Platform::Linux);
        let spec = ScheduleSpec::compute(4, 5).unwrap();
        let python = Path::new("/opt/mtr-logger/venv/bin/python");
        vec![
            JobDescriptor::logger(&config, python, &spec),
            JobDescriptor::archiver(&config, python),
        ]
    }

    #[test]
    fn register_deletes_before_creating() {
        let backend = FakeBackend::default();
        let job = &jobs()[0];
        JobRegistrar::new(&backend).register(job).unwrap();
        assert_eq!(
            *backend.ops.borrow(),
            vec!["remove mtr-logger", "create mtr-logger"]
        );
    }

    #[test]
    fn registering_twice_leaves_one_entry() {
        let backend = FakeBackend::default();
        let registrar = JobRegistrar::new(&backend);
        let job = &jobs()[0];

        registrar.register(job).unwrap();
        registrar.register(job).unwrap();
        assert_eq!(backend.count("mtr-logger"), 1);
    }

    #[test]
    fn register_all_then_status_and_unregister() {
        let backend = FakeBackend::default();
        let registrar = JobRegistrar::new(&backend);

        let names = registrar.register_all(&jobs()).unwrap();
        assert_eq!(names, vec!["mtr-logger", "mtr-logger-archiver"]);

        let status: BTreeMap<_, _> = registrar.status(&names).unwrap().into_iter().collect();
        assert_eq!(status.get("mtr-logger"), Some(&true));
        assert_eq!(status.get("mtr-logger-archiver"), Some(&true));

        registrar.unregister(&names).unwrap();
        assert!(registrar.status(&names).unwrap().iter().all(|(_, present)| !present));
    }

    #[test]
    fn no_scheduler_is_unavailable() {
        let runner = MockRunner::new();
        let err = backend_for(None, &runner, Path::new("/tmp/jobs"))
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::SchedulerUnavailable { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn backend_matches_family() {
        let runner = MockRunner::new();
        let cron = backend_for(Some(SchedulerFamily::Cron), &runner, Path::new("/tmp")).unwrap();
        assert_eq!(cron.family(), SchedulerFamily::Cron);
        let tasks =
            backend_for(Some(SchedulerFamily::TaskScheduler), &runner, Path::new("/tmp")).unwrap();
        assert_eq!(tasks.family(), SchedulerFamily::TaskScheduler);
    }
}
