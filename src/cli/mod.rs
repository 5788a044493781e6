//! Argument parsing and the subcommands behind it.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, InstallArgs, ScheduleArgs, StatusArgs, UninstallArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
