//! Answers-file loading and command-line overrides.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::schema::DesiredConfig;
use crate::error::{Result, SetupError};

/// Values given on the command line; each one beats the answers file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub min_runtime_version: Option<String>,
}

impl ConfigOverrides {
    /// Apply every present override onto `config`.
    pub fn apply(&self, config: &mut DesiredConfig) {
        if let Some(url) = &self.repo_url {
            config.repo_url = url.clone();
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        if let Some(floor) = &self.min_runtime_version {
            config.min_runtime_version = floor.clone();
        }
    }
}

/// Load an answers file. Missing keys keep their defaults.
pub fn load_answers(path: &Path) -> Result<DesiredConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SetupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SetupError::Io(e)
        }
    })?;

    parse_answers(&content, path)
}

/// Parse YAML answers content.
pub fn parse_answers(content: &str, source_path: &Path) -> Result<DesiredConfig> {
    // An empty file is a valid "all defaults" answers file.
    if content.trim().is_empty() {
        return Ok(DesiredConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| SetupError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Build the pre-prompt configuration: defaults, answers file, overrides.
pub fn layered_config(answers: Option<&Path>, overrides: &ConfigOverrides) -> Result<DesiredConfig> {
    let mut config = match answers {
        Some(path) => {
            debug!("Loading answers from {}", path.display());
            load_answers(path)?
        }
        None => DesiredConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}
