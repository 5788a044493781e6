//! Interactive terminal front end.
//!
//! Steps and outcomes go to stdout; warnings, errors and the failure block go
//! to stderr so `mtr-setup ... 2>install.err` keeps what went wrong.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::{
    prompt_user, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt, PromptResult,
    SetupTheme, SpinnerHandle, UserInterface,
};

pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: SetupTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: SetupTheme::detect(),
            mode,
        }
    }

    fn out_line(&mut self, line: &str) {
        writeln!(self.out, "{line}").ok();
    }

    fn err_line(&mut self, line: &str) {
        writeln!(self.err, "{line}").ok();
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_steps() {
            self.out_line(msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_outcomes() {
            let line = self.theme.format_success(msg);
            self.out_line(&line);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_outcomes() {
            let line = self.theme.format_warning(msg);
            self.err_line(&line);
        }
    }

    fn error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.err_line(&line);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.out)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_steps() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_steps() {
            let line = self.theme.format_header(title);
            self.out_line("");
            self.out_line(&line);
        }
    }

    fn show_progress(&mut self, current: usize, total: usize, label: &str) {
        if self.mode.shows_steps() {
            let line = self.theme.format_progress(current, total, label);
            self.out_line(&line);
        }
    }

    fn show_error_block(&mut self, title: &str, output: &str) {
        for line in self.theme.format_block(title, output) {
            self.err_line(&line);
        }
    }

    fn is_interactive(&self) -> bool {
        self.out.is_term()
    }
}

/// The terminal front end when asked for and stdout is a terminal; the
/// line-oriented one otherwise.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
