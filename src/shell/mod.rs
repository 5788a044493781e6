//! Child process execution and platform facts.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    run_checked, run_succeeds, tail_lines, CommandOptions, CommandResult, CommandRunner,
    Invocation, SystemRunner, TAIL_LINES,
};
pub use mock::{MockResponse, MockRunner};
pub use platform::{
    is_ci, is_elevated, is_executable, parse_system_path, resolve_tool_path, which, Platform,
};
