//! mtr-setup - Install, update and schedule the mtr-logger diagnostics tool.
//!
//! The installer provisions a Python runtime, syncs the logger's source,
//! builds an isolated environment for it, registers its recurring jobs with
//! the host scheduler and publishes a command on `PATH`. Reruns converge on
//! the same result.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Desired configuration, answers files and prompts
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - HTTP downloads and git operations
//! - [`host`] - Host capability detection and package managers
//! - [`jobs`] - Scheduler backends and job registration
//! - [`pipeline`] - Install and uninstall orchestration
//! - [`publish`] - Wrapper, uninstall script and `PATH` entry
//! - [`repo`] - Source checkout synchronization
//! - [`runtime`] - Python runtime discovery and installation
//! - [`schedule`] - Run-window arithmetic
//! - [`selftest`] - Post-install trial run
//! - [`shell`] - Child process execution
//! - [`state`] - Persisted installation state
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`venv`] - Isolated environment provisioning
//!
//! # Example
//!
//! ```
//! use mtr_setup::schedule::ScheduleSpec;
//!
//! let spec = ScheduleSpec::compute(4, 5).unwrap();
//! assert_eq!(spec.minute_marks, vec![0, 15, 30, 45]);
//! assert_eq!(spec.duration_seconds, 895);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod jobs;
pub mod pipeline;
pub mod publish;
pub mod repo;
pub mod runtime;
pub mod schedule;
pub mod selftest;
pub mod shell;
pub mod state;
pub mod ui;
pub mod venv;

pub use error::{Result, SetupError};
