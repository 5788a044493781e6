//! Non-interactive UI for unattended runs.

use std::collections::HashMap;

use crate::error::{Result, SetupError};

use super::{OutputMode, Prompt, PromptResult, SetupTheme, SpinnerHandle, UserInterface};

/// Prefix for environment variables that answer prompts, e.g.
/// `MTR_SETUP_PROMPT_TARGET=1.1.1.1`.
pub const PROMPT_ENV_PREFIX: &str = "MTR_SETUP_PROMPT_";

/// Line-oriented front end for CI, provisioning tools and piped output.
///
/// Prompts resolve from `MTR_SETUP_PROMPT_<KEY>` overrides, then from the
/// prompt's default. A prompt with neither is a configuration error.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: SetupTheme,
    answers: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Answers come from the process environment.
    pub fn new(mode: OutputMode) -> Self {
        let answers = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();
        Self::with_overrides(mode, answers)
    }

    /// Answers keyed by full variable name, e.g. `MTR_SETUP_PROMPT_TARGET`.
    pub fn with_overrides(mode: OutputMode, answers: HashMap<String, String>) -> Self {
        Self {
            mode,
            theme: SetupTheme::plain(),
            answers,
        }
    }

    fn answer_from_env(&self, key: &str) -> Option<String> {
        let var = format!("{}{}", PROMPT_ENV_PREFIX, key.to_uppercase());
        self.answers.get(&var).cloned()
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_steps() {
            println!("{msg}");
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_outcomes() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_outcomes() {
            eprintln!("{}", self.theme.format_warning(msg));
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let answer = self
            .answer_from_env(&prompt.key)
            .or_else(|| prompt.default.clone())
            .ok_or_else(|| SetupError::InvalidConfig {
                message: format!(
                    "'{}' needs an answer: set {}{}",
                    prompt.key,
                    PROMPT_ENV_PREFIX,
                    prompt.key.to_uppercase()
                ),
            })?;
        tracing::debug!("{} = {} (unattended)", prompt.key, answer);
        Ok(PromptResult::String(answer))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let show = self.mode.shows_steps();
        if show {
            println!("  {message} ...");
        }
        Box::new(LineSpinner {
            show,
            theme: self.theme.clone(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_steps() {
            println!();
            println!("{}", self.theme.format_header(title));
        }
    }

    fn show_progress(&mut self, current: usize, total: usize, label: &str) {
        if self.mode.shows_steps() {
            println!("{}", self.theme.format_progress(current, total, label));
        }
    }

    fn show_error_block(&mut self, title: &str, output: &str) {
        for line in self.theme.format_block(title, output) {
            eprintln!("{line}");
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prints one line when the work finishes.
struct LineSpinner {
    show: bool,
    theme: SetupTheme,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("  {}", self.theme.format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  {}", self.theme.format_error(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptType;

    fn bare_prompt(key: &str) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "Question?".to_string(),
            prompt_type: PromptType::Input,
            default: None,
        }
    }

    #[test]
    fn uses_env_override() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "MTR_SETUP_PROMPT_TARGET".to_string(),
            "1.1.1.1".to_string(),
        );
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);

        let result = ui.prompt(&Prompt::input("target", "Target", "8.8.8.8")).unwrap();
        assert_eq!(result.as_string(), "1.1.1.1");
    }

    #[test]
    fn falls_back_to_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let result = ui.prompt(&Prompt::input("target", "Target", "8.8.8.8")).unwrap();
        assert_eq!(result.as_string(), "8.8.8.8");
    }

    #[test]
    fn errors_without_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let err = ui.prompt(&bare_prompt("target")).unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig { .. }));
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
