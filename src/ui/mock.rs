//! In-memory [`UserInterface`] for tests.
//!
//! Everything shown is appended to one transcript in order; the accessors
//! below slice it by kind. Answers are scripted per prompt key.
//!
//! ```
//! use mtr_setup::ui::{MockUI, Prompt, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("target", "1.1.1.1");
//!
//! let answer = ui.prompt(&Prompt::input("target", "Target", "8.8.8.8")).unwrap();
//! assert_eq!(answer.as_string(), "1.1.1.1");
//!
//! ui.success("Done!");
//! assert!(ui.successes().contains(&"Done!".to_string()));
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::Result;

use super::{
    parse_yes_no, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shown {
    Message(String),
    Success(String),
    Warning(String),
    Error(String),
    Header(String),
    Step(usize, usize, String),
    Spinner(String),
    Block(String, String),
    Asked(String),
}

/// Answer lookup order: the key's queue, its fixed answer, the catch-all,
/// then the prompt's own default.
#[derive(Debug, Default)]
struct Script {
    queued: HashMap<String, VecDeque<String>>,
    fixed: HashMap<String, String>,
    fallback: Option<String>,
}

impl Script {
    fn answer(&mut self, prompt: &Prompt) -> String {
        if let Some(next) = self
            .queued
            .get_mut(&prompt.key)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        self.fixed
            .get(&prompt.key)
            .or(self.fallback.as_ref())
            .or(prompt.default.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    shown: Vec<Shown>,
    script: Script,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.script.fixed.insert(key.into(), response.into());
    }

    /// Answers handed out one per ask before the fixed answer applies.
    /// Used to drive re-prompting after invalid input.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        self.script.queued.insert(
            key.into(),
            responses.into_iter().map(String::from).collect(),
        );
    }

    pub fn set_default_prompt_response(&mut self, response: &str) {
        self.script.fallback = Some(response.into());
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn texts(&self, pick: impl Fn(&Shown) -> Option<&String>) -> Vec<String> {
        self.shown.iter().filter_map(pick).cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn successes(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Success(m) => Some(m),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Warning(m) => Some(m),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Error(m) => Some(m),
            _ => None,
        })
    }

    pub fn headers(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Header(m) => Some(m),
            _ => None,
        })
    }

    pub fn spinners(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Spinner(m) => Some(m),
            _ => None,
        })
    }

    /// Prompt keys in the order they were asked.
    pub fn prompts_shown(&self) -> Vec<String> {
        self.texts(|s| match s {
            Shown::Asked(key) => Some(key),
            _ => None,
        })
    }

    /// `(current, total, label)` for every step line.
    pub fn progress(&self) -> Vec<(usize, usize, String)> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Step(n, total, label) => Some((*n, *total, label.clone())),
                _ => None,
            })
            .collect()
    }

    /// `(title, output)` for every framed failure block.
    pub fn error_blocks(&self) -> Vec<(String, String)> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Block(title, output) => Some((title.clone(), output.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn has_warning(&self, needle: &str) -> bool {
        self.shown
            .iter()
            .any(|s| matches!(s, Shown::Warning(m) if m.contains(needle)))
    }

    pub fn has_error(&self, needle: &str) -> bool {
        self.shown
            .iter()
            .any(|s| matches!(s, Shown::Error(m) if m.contains(needle)))
    }

    /// Plain messages and success lines both count.
    pub fn has_message(&self, needle: &str) -> bool {
        self.shown.iter().any(|s| {
            matches!(s, Shown::Message(m) | Shown::Success(m) if m.contains(needle))
        })
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.shown.push(Shown::Message(msg.into()));
    }

    fn success(&mut self, msg: &str) {
        self.shown.push(Shown::Success(msg.into()));
    }

    fn warning(&mut self, msg: &str) {
        self.shown.push(Shown::Warning(msg.into()));
    }

    fn error(&mut self, msg: &str) {
        self.shown.push(Shown::Error(msg.into()));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.shown.push(Shown::Asked(prompt.key.clone()));
        let answer = self.script.answer(prompt);
        Ok(match prompt.prompt_type {
            PromptType::Confirm => PromptResult::Bool(parse_yes_no(&answer).unwrap_or(false)),
            PromptType::Input | PromptType::Select { .. } => PromptResult::String(answer),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.shown.push(Shown::Spinner(message.into()));
        Box::new(MockSpinner)
    }

    fn show_header(&mut self, title: &str) {
        self.shown.push(Shown::Header(title.into()));
    }

    fn show_progress(&mut self, current: usize, total: usize, label: &str) {
        self.shown.push(Shown::Step(current, total, label.into()));
    }

    fn show_error_block(&mut self, title: &str, output: &str) {
        self.shown.push(Shown::Block(title.into(), output.into()));
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

#[derive(Debug)]
pub struct MockSpinner;

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}
    fn finish_success(&mut self, _msg: &str) {}
    fn finish_error(&mut self, _msg: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_status_lines() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.warning("careful");
        ui.error("boom");
        ui.show_progress(2, 8, "Resolving runtime");

        assert!(ui.has_message("hello"));
        assert!(ui.has_warning("care"));
        assert!(ui.has_error("boom"));
        assert_eq!(ui.progress()[0], (2, 8, "Resolving runtime".to_string()));
    }

    #[test]
    fn queued_responses_come_first() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("probes", "3");
        ui.queue_prompt_responses("probes", vec!["zero", "7"]);
        let prompt = Prompt::input("probes", "Probes", "3");

        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "zero");
        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "7");
        assert_eq!(ui.prompt(&prompt).unwrap().as_string(), "3");
        assert_eq!(ui.prompts_shown().len(), 3);
    }

    #[test]
    fn confirm_prompt_returns_bool() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("purge", "yes");
        let result = ui.prompt(&Prompt::confirm("purge", "Purge?", false)).unwrap();
        assert_eq!(result.as_bool(), Some(true));
    }

    #[test]
    fn falls_back_to_prompt_default() {
        let mut ui = MockUI::new();
        let result = ui.prompt(&Prompt::input("target", "T", "8.8.8.8")).unwrap();
        assert_eq!(result.as_string(), "8.8.8.8");
    }

    #[test]
    fn transcript_keeps_kinds_apart() {
        let mut ui = MockUI::new();
        ui.show_header("Uninstalling mtr-logger");
        ui.success("Removed /opt/mtr-logger");
        ui.show_error_block("pip", "ERROR");

        assert_eq!(ui.headers(), ["Uninstalling mtr-logger"]);
        assert!(ui.messages().is_empty());
        assert!(ui.has_message("Removed"));
        assert_eq!(ui.error_blocks()[0].0, "pip");
    }
}
