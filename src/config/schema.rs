//! Desired installation configuration.
//!
//! [`DesiredConfig`] is built once per run: built-in defaults, then an
//! optional YAML answers file, then command-line overrides, then prompts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::shell::Platform;

/// Probe protocol passed to the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proto {
    Udp,
    #[default]
    Icmp,
    Tcp,
}

impl Proto {
    pub const ALL: [&'static str; 3] = ["udp", "icmp", "tcp"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Proto::Udp => "udp",
            Proto::Icmp => "icmp",
            Proto::Tcp => "tcp",
        }
    }
}

impl FromStr for Proto {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "udp" => Ok(Proto::Udp),
            "icmp" => Ok(Proto::Icmp),
            "tcp" => Ok(Proto::Tcp),
            other => Err(format!("unknown protocol '{}' (expected udp, icmp or tcp)", other)),
        }
    }
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hop name resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsMode {
    #[default]
    Auto,
    On,
    Off,
}

impl DnsMode {
    pub const ALL: [&'static str; 3] = ["auto", "on", "off"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DnsMode::Auto => "auto",
            DnsMode::On => "on",
            DnsMode::Off => "off",
        }
    }
}

impl FromStr for DnsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DnsMode::Auto),
            "on" => Ok(DnsMode::On),
            "off" => Ok(DnsMode::Off),
            other => Err(format!("unknown dns mode '{}' (expected auto, on or off)", other)),
        }
    }
}

impl fmt::Display for DnsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report border style. `Ascii` adds `--ascii` to the logger command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Ascii,
    Unicode,
}

impl BorderStyle {
    pub const ALL: [&'static str; 2] = ["ascii", "unicode"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Ascii => "ascii",
            BorderStyle::Unicode => "unicode",
        }
    }
}

impl FromStr for BorderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ascii" => Ok(BorderStyle::Ascii),
            "unicode" => Ok(BorderStyle::Unicode),
            other => Err(format!("unknown border style '{}' (expected ascii or unicode)", other)),
        }
    }
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the installer needs to know about the desired end state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredConfig {
    /// Source repository of the logger package.
    pub repo_url: String,

    /// Branch to deploy.
    pub branch: String,

    /// Root for `src/`, `venv/`, job scripts and the state file.
    pub install_root: PathBuf,

    /// Directory receiving the wrapper and uninstall commands.
    pub bin_dir: PathBuf,

    /// Probe target (hostname or IP).
    pub target: String,

    pub proto: Proto,

    pub dns: DnsMode,

    /// Seconds between ping rounds.
    pub interval: f64,

    /// Per-probe timeout in seconds.
    pub timeout: f64,

    /// Probes per TTL.
    pub probes: u32,

    pub border_style: BorderStyle,

    /// Logger runs per hour; must divide 60.
    pub logs_per_hour: u32,

    /// Seconds of slack between the end of one run and the next firing.
    pub safety_margin_sec: u32,

    /// Days of reports the archiver keeps.
    pub archive_retention_days: u32,

    /// Module run by the logger job (`python -m <package_module>`).
    pub package_module: String,

    /// Module run by the archiver job.
    pub archiver_module: String,

    /// File whose presence proves the checkout is the expected package.
    pub manifest_marker: String,

    /// Lowest acceptable runtime version (`major.minor.patch`).
    pub min_runtime_version: String,

    /// Name of the published wrapper command.
    pub command_name: String,

    /// Directory the logger writes its reports into.
    pub log_dir: PathBuf,

    /// Hour of day (0-23) the archiver runs.
    pub archive_hour: u32,
}

impl Default for DesiredConfig {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl DesiredConfig {
    /// Defaults for a given platform.
    pub fn for_platform(platform: Platform) -> Self {
        let (install_root, bin_dir) = if platform.is_windows() {
            let root = PathBuf::from(r"C:\ProgramData\mtr-logger");
            let bin = root.join("bin");
            (root, bin)
        } else {
            (
                PathBuf::from("/opt/mtr-logger"),
                PathBuf::from("/usr/local/bin"),
            )
        };

        let home = dirs::home_dir().unwrap_or_else(|| install_root.clone());

        Self {
            repo_url: "https://github.com/mtrpy/mtrpy.git".to_string(),
            branch: "main".to_string(),
            install_root,
            bin_dir,
            target: "8.8.8.8".to_string(),
            proto: Proto::Icmp,
            dns: DnsMode::Auto,
            interval: 1.0,
            timeout: 5.0,
            probes: 3,
            border_style: BorderStyle::Ascii,
            logs_per_hour: 4,
            safety_margin_sec: 5,
            archive_retention_days: 90,
            package_module: "mtrpy".to_string(),
            archiver_module: "mtrpy.archiver".to_string(),
            manifest_marker: "pyproject.toml".to_string(),
            min_runtime_version: "3.8.0".to_string(),
            command_name: "mtr-logger".to_string(),
            log_dir: home.join("mtr").join("logs"),
            archive_hour: 0,
        }
    }

    /// Checkout location.
    pub fn src_dir(&self) -> PathBuf {
        self.install_root.join("src")
    }

    /// Isolated environment location.
    pub fn venv_dir(&self) -> PathBuf {
        self.install_root.join("venv")
    }

    /// Location of an embeddable runtime bundle.
    pub fn runtime_dir(&self) -> PathBuf {
        self.install_root.join("runtime")
    }

    /// Location of generated per-job scripts.
    pub fn jobs_dir(&self) -> PathBuf {
        self.install_root.join("jobs")
    }

    /// Location of the persisted installation state.
    pub fn state_file(&self) -> PathBuf {
        self.install_root.join(crate::state::STATE_FILE_NAME)
    }
}
