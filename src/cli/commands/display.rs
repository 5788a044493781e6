//! Shared display helpers for failures and job status.

use crate::error::SetupError;
use crate::ui::UserInterface;

use super::dispatcher::CommandResult;

/// Show a fatal error, with the failing child's output when there is any,
/// and map it to the process exit code.
pub fn report_failure(ui: &mut dyn UserInterface, err: &SetupError) -> CommandResult {
    if let Some(tail) = err.diagnostic_tail() {
        ui.show_error_block("Last output before failure", tail);
    }
    ui.error(&err.to_string());
    CommandResult::failure(err.exit_code())
}

/// Print one job's presence in the scheduler.
pub fn show_job_status(ui: &mut dyn UserInterface, name: &str, present: bool) {
    if present {
        ui.success(&format!("  [ok] {name}"));
    } else {
        ui.warning(&format!("  [missing] {name}"));
    }
}
