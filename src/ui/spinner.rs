//! Spinner for long child processes (pip, package managers, downloads).

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::SetupTheme;
use super::SpinnerHandle;

const TICK: Duration = Duration::from_millis(100);

pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: SetupTheme,
}

impl ProgressSpinner {
    /// Start spinning with elapsed time shown; pip installs can take minutes.
    pub fn new(message: &str, theme: SetupTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner} {msg} ({elapsed})") {
            bar.set_style(style.tick_chars("-\\|/ "));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar, theme }
    }

    /// A spinner that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: SetupTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::with_template("  {msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }
}
