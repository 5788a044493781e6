//! Recurring jobs for the host scheduler.
//!
//! A [`JobDescriptor`] is rendered by one encoder per scheduler family
//! ([`cron`], [`schtasks`]) and registered through a [`SchedulerBackend`].
//! Registration is delete-then-create, so re-running the installer never
//! stacks duplicate entries.

pub mod cron;
pub mod descriptor;
pub mod registrar;
pub mod schtasks;

pub use cron::CrontabBackend;
pub use descriptor::{
    job_log, logger_args, JobDescriptor, JobKind, PrivilegeLevel, Recurrence, ARCHIVER_JOB,
    LOGGER_JOB,
};
pub use registrar::{backend_for, JobRegistrar, SchedulerBackend};
pub use schtasks::TaskSchedulerBackend;
