//! One module per subcommand, plus the dispatcher and shared display
//! helpers.
//!
//! `install` and `uninstall` drive the pipelines in [`crate::pipeline`];
//! `schedule` only computes and prints; `status` reads the state file and
//! asks the scheduler which jobs exist.

pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod install;
pub mod schedule;
pub mod status;
pub mod uninstall;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
