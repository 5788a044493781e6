//! The interactive questionnaire.
//!
//! Thirteen prompts, asked in a fixed order, each defaulting to the value
//! already layered into the configuration.

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::schema::{BorderStyle, DesiredConfig, DnsMode, Proto};
use crate::error::{Result, SetupError};
use crate::ui::{Prompt, UserInterface};

/// Re-prompts allowed for one question before giving up.
const MAX_ATTEMPTS: usize = 5;

/// Prompt keys in the order they are asked.
pub const PROMPT_KEYS: [&str; 13] = [
    "repo_url",
    "branch",
    "install_root",
    "bin_dir",
    "target",
    "proto",
    "dns",
    "interval",
    "timeout",
    "probes",
    "border_style",
    "logs_per_hour",
    "safety_margin",
];

/// Ask every question and return the final configuration.
pub fn collect(base: DesiredConfig, ui: &mut dyn UserInterface) -> Result<DesiredConfig> {
    let mut config = base;

    config.repo_url = ask_text(ui, "repo_url", "Repository URL", &config.repo_url)?;
    config.branch = ask_text(ui, "branch", "Branch", &config.branch)?;
    config.install_root = PathBuf::from(ask_text(
        ui,
        "install_root",
        "Install prefix",
        &config.install_root.display().to_string(),
    )?);
    config.bin_dir = PathBuf::from(ask_text(
        ui,
        "bin_dir",
        "Wrapper directory",
        &config.bin_dir.display().to_string(),
    )?);
    config.target = ask_text(ui, "target", "Probe target (host or IP)", &config.target)?;
    config.proto = ask_choice::<Proto>(ui, "proto", "Protocol", &Proto::ALL, config.proto.as_str())?;
    config.dns = ask_choice::<DnsMode>(ui, "dns", "DNS mode", &DnsMode::ALL, config.dns.as_str())?;
    config.interval = ask_parsed(ui, "interval", "Interval (seconds)", config.interval, |v: &f64| {
        *v > 0.0
    })?;
    config.timeout = ask_parsed(ui, "timeout", "Timeout (seconds)", config.timeout, |v: &f64| {
        *v > 0.0
    })?;
    config.probes = ask_parsed(ui, "probes", "Probes per hop", config.probes, |v: &u32| *v >= 1)?;
    config.border_style = ask_choice::<BorderStyle>(
        ui,
        "border_style",
        "Border style",
        &BorderStyle::ALL,
        config.border_style.as_str(),
    )?;
    // Divisibility is checked by the schedule calculator so that an
    // invalid value still maps to its own exit code.
    config.logs_per_hour = ask_parsed(
        ui,
        "logs_per_hour",
        "Logs per hour (must divide 60)",
        config.logs_per_hour,
        |_| true,
    )?;
    config.safety_margin_sec = ask_parsed(
        ui,
        "safety_margin",
        "Safety margin (seconds)",
        config.safety_margin_sec,
        |_| true,
    )?;

    Ok(config)
}

fn ask_text(ui: &mut dyn UserInterface, key: &str, question: &str, default: &str) -> Result<String> {
    ask_parsed(ui, key, question, default.to_string(), |v: &String| {
        !v.trim().is_empty()
    })
}

fn ask_choice<T>(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    values: &[&str],
    default: &str,
) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let prompt = Prompt::select(key, question, values, default);
    ask_until_valid(ui, &prompt, default, |raw| raw.parse::<T>())
}

fn ask_parsed<T, V>(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    default: T,
    valid: V,
) -> Result<T>
where
    T: FromStr + ToString,
    V: Fn(&T) -> bool,
{
    let default = default.to_string();
    let prompt = Prompt::input(key, question, &default);
    ask_until_valid(ui, &prompt, &default, |raw| match raw.parse::<T>() {
        Ok(v) if valid(&v) => Ok(v),
        _ => Err(format!("'{}' is not a valid value for {}", raw, key)),
    })
}

/// Ask `prompt` until `parse` accepts the answer. A blank answer means the
/// default. Invalid answers are re-asked when interactive and are an error
/// otherwise.
fn ask_until_valid<T, P>(
    ui: &mut dyn UserInterface,
    prompt: &Prompt,
    default: &str,
    parse: P,
) -> Result<T>
where
    P: Fn(&str) -> std::result::Result<T, String>,
{
    let mut last_error = String::new();
    for _ in 0..MAX_ATTEMPTS {
        let answer = ui.prompt(prompt)?.as_string();
        let raw = if answer.trim().is_empty() {
            default
        } else {
            answer.trim()
        };

        match parse(raw) {
            Ok(value) => return Ok(value),
            Err(message) => {
                if !ui.is_interactive() {
                    return Err(SetupError::InvalidConfig { message });
                }
                ui.warning(&format!("{} (default: {})", message, default));
                last_error = message;
            }
        }
    }

    Err(SetupError::InvalidConfig {
        message: format!("too many invalid answers for {}: {}", prompt.key, last_error),
    })
}
