//! Persistent installation state.
//!
//! The installer writes this file after each completed step, so a failed
//! run still records how far it got. `status` and `uninstall` read it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SetupError};
use crate::schedule::ScheduleSpec;
use crate::shell::Platform;
use crate::venv::EnvKind;

/// File name of the state file inside the install root.
pub const STATE_FILE_NAME: &str = "install-state.json";

/// What is installed on this host, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationState {
    /// Schema version for migration.
    pub version: u32,

    pub platform: Platform,

    pub install_root: PathBuf,

    /// First successful write.
    pub installed_at: DateTime<Utc>,

    /// Most recent write.
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub runtime_exe: Option<PathBuf>,

    #[serde(default)]
    pub runtime_version: Option<String>,

    #[serde(default)]
    pub env_kind: Option<EnvKind>,

    #[serde(default)]
    pub env_path: Option<PathBuf>,

    #[serde(default)]
    pub src_path: Option<PathBuf>,

    /// Commit the checkout was synced to, when known.
    #[serde(default)]
    pub commit: Option<String>,

    #[serde(default)]
    pub wrapper_path: Option<PathBuf>,

    #[serde(default)]
    pub uninstall_path: Option<PathBuf>,

    /// Managed profile or registry entry that put the wrapper on `PATH`.
    #[serde(default)]
    pub path_entry: Option<String>,

    #[serde(default)]
    pub schedule: Option<ScheduleSpec>,

    #[serde(default)]
    pub registered_jobs: Vec<String>,

    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl InstallationState {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Fresh state for an install rooted at `install_root`.
    pub fn new(platform: Platform, install_root: &Path) -> Self {
        let now = Utc::now();
        Self {
            version: Self::CURRENT_VERSION,
            platform,
            install_root: install_root.to_path_buf(),
            installed_at: now,
            updated_at: now,
            runtime_exe: None,
            runtime_version: None,
            env_kind: None,
            env_path: None,
            src_path: None,
            commit: None,
            wrapper_path: None,
            uninstall_path: None,
            path_entry: None,
            schedule: None,
            registered_jobs: Vec::new(),
            log_dir: None,
        }
    }

    /// State file inside `install_root`.
    pub fn state_file(install_root: &Path) -> PathBuf {
        install_root.join(STATE_FILE_NAME)
    }

    /// Load state from `path`; `None` when nothing was ever installed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let state = serde_json::from_str(&content).map_err(|e| SetupError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Some(state))
    }

    /// Load the previous state for `install_root`, or start a new one.
    ///
    /// Keeps the original `installed_at` across re-runs.
    pub fn load_or_new(platform: Platform, install_root: &Path) -> Result<Self> {
        Ok(Self::load(&Self::state_file(install_root))?
            .unwrap_or_else(|| Self::new(platform, install_root)))
    }

    /// Save to `<install_root>/install-state.json` with an atomic rename.
    pub fn save(&mut self) -> Result<()> {
        self.updated_at = Utc::now();
        fs::create_dir_all(&self.install_root)?;

        let path = Self::state_file(&self.install_root);
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            SetupError::Other(anyhow::anyhow!("Failed to serialize state: {}", e))
        })?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Record a registered job name once.
    pub fn record_job(&mut self, name: &str) {
        if !self.registered_jobs.iter().any(|j| j == name) {
            self.registered_jobs.push(name.to_string());
        }
    }
}
