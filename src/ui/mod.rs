//! User-facing output and prompts.
//!
//! - [`TerminalUI`]: colors, spinners and `dialoguer` prompts
//! - [`NonInteractiveUI`]: plain lines, answers from the environment
//! - [`MockUI`]: records everything, answers from a script
//!
//! # Example
//!
//! ```
//! use mtr_setup::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("mtr-logger setup");
//! ui.success("Installed");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::prompt_user;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, SetupTheme};

use crate::error::Result;

/// Everything the installer says to, or asks of, the person running it.
///
/// Components never print; they report through this trait so a run can be
/// driven by a terminal, by environment variables, or by [`MockUI`].
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Informational line; hidden below [`OutputMode::Normal`].
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    /// Something went wrong but the run continues.
    fn warning(&mut self, msg: &str);

    /// Always shown.
    fn error(&mut self, msg: &str);

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn show_header(&mut self, title: &str);

    /// `[current/total] label`
    fn show_progress(&mut self, current: usize, total: usize, label: &str);

    /// Framed output of a failed child, shown before abort.
    fn show_error_block(&mut self, title: &str, output: &str);

    /// Whether prompts reach a person.
    fn is_interactive(&self) -> bool;
}

/// A running spinner. Finishing replaces it with one status line.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);
    fn finish_success(&mut self, msg: &str);
    fn finish_error(&mut self, msg: &str);
}

/// One question. `key` identifies it for answer files, environment
/// overrides and scripted test answers.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub key: String,
    pub question: String,
    pub prompt_type: PromptType,
    /// Used on an empty answer and in unattended runs.
    pub default: Option<String>,
}

impl Prompt {
    fn new(key: &str, question: &str, prompt_type: PromptType, default: String) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            prompt_type,
            default: Some(default),
        }
    }

    /// Yes/no question. The default is stored as `yes` or `no`.
    pub fn confirm(key: &str, question: &str, default: bool) -> Self {
        let default = if default { "yes" } else { "no" };
        Self::new(key, question, PromptType::Confirm, default.to_string())
    }

    pub fn input(key: &str, question: &str, default: &str) -> Self {
        Self::new(key, question, PromptType::Input, default.to_string())
    }

    /// Pick one of `values`.
    pub fn select(key: &str, question: &str, values: &[&str], default: &str) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        Self::new(key, question, PromptType::Select { values }, default.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptType {
    Confirm,
    Input,
    Select { values: Vec<String> },
}

/// An answer. Front ends without a native yes/no widget answer confirms
/// with a string, which [`PromptResult::as_bool`] reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Bool(bool),
    String(String),
}

impl PromptResult {
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Get as bool. Strings are read the way confirm defaults are written.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => parse_yes_no(s),
        }
    }
}

/// Read "yes"/"no" style answers.
pub fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
