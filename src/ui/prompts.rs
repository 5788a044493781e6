//! `dialoguer` widgets behind [`Prompt`].

use console::Term;
use dialoguer::{Confirm, Input, Select};

use crate::error::{Result, SetupError};

use super::{parse_yes_no, Prompt, PromptResult, PromptType};

// A closed or interrupted terminal surfaces as an I/O error.
fn map_dialoguer_err(e: dialoguer::Error) -> SetupError {
    SetupError::Io(e.into())
}

/// Ask `prompt` on `term` and wait for the answer.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::Input => prompt_input(prompt, term),
        PromptType::Select { values } => prompt_select(prompt, values, term),
    }
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let default = prompt
        .default
        .as_deref()
        .and_then(parse_yes_no)
        .unwrap_or(false);

    let result = Confirm::new()
        .with_prompt(&prompt.question)
        .default(default)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_input(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let mut input = Input::<String>::new()
        .with_prompt(&prompt.question)
        .allow_empty(true);
    if let Some(default) = &prompt.default {
        input = input.default(default.clone()).show_default(true);
    }
    let answer = input.interact_text_on(term).map_err(map_dialoguer_err)?;

    Ok(PromptResult::String(answer.trim().to_string()))
}

fn prompt_select(prompt: &Prompt, values: &[String], term: &Term) -> Result<PromptResult> {
    let default_idx = prompt
        .default
        .as_ref()
        .and_then(|d| values.iter().position(|v| v == d))
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt(&prompt.question)
        .items(values)
        .default(default_idx)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::String(values[selection].clone()))
}
