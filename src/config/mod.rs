//! Installer configuration.
//!
//! - Schema and defaults in [`schema`]
//! - Answers file and command-line overrides in [`loader`]
//! - The interactive questionnaire in [`prompts`]
//!
//! # Example
//!
//! ```
//! use mtr_setup::config::{collect, DesiredConfig};
//! use mtr_setup::ui::MockUI;
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("target", "1.1.1.1");
//!
//! let config = collect(DesiredConfig::default(), &mut ui).unwrap();
//! assert_eq!(config.target, "1.1.1.1");
//! assert_eq!(config.logs_per_hour, 4);
//! ```

pub mod loader;
pub mod prompts;
pub mod schema;

pub use loader::{layered_config, load_answers, parse_answers, ConfigOverrides};
pub use prompts::{collect, PROMPT_KEYS};
pub use schema::{BorderStyle, DesiredConfig, DnsMode, Proto};
