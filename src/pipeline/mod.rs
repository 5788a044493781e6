//! Install and uninstall orchestration.
//!
//! Both run strictly in sequence on one thread. Host access goes through
//! the capability interfaces ([`CommandRunner`](crate::shell::CommandRunner),
//! [`SchedulerBackend`](crate::jobs::SchedulerBackend)), so whole runs are
//! exercised against fakes in tests.

pub mod install;
pub mod uninstall;

pub use install::{InstallOptions, InstallPipeline, InstallReport, INSTALL_STEPS};
pub use uninstall::{UninstallOptions, UninstallReport, Uninstaller};
