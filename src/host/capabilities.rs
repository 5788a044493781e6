//! Host capability detection.
//!
//! Identifies the package manager, privilege level and scheduler family
//! once at the start of a run. Detection only reads host state.

use std::path::PathBuf;

use crate::shell::{is_elevated, parse_system_path, resolve_tool_path, Platform};

/// Detected system package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    AptGet,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Apk,
    Homebrew,
    Winget,
    Chocolatey,
}

impl PackageManager {
    /// Binary that identifies this manager on PATH.
    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::AptGet => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
            PackageManager::Apk => "apk",
            PackageManager::Homebrew => "brew",
            PackageManager::Winget => "winget",
            PackageManager::Chocolatey => "choco",
        }
    }

    /// Probe order for a platform; the first one present wins.
    pub fn candidates(platform: Platform) -> &'static [PackageManager] {
        match platform {
            Platform::Linux => &[
                PackageManager::AptGet,
                PackageManager::Dnf,
                PackageManager::Yum,
                PackageManager::Pacman,
                PackageManager::Zypper,
                PackageManager::Apk,
                PackageManager::Homebrew,
            ],
            Platform::MacOS => &[PackageManager::Homebrew],
            Platform::Windows => &[PackageManager::Winget, PackageManager::Chocolatey],
        }
    }
}

/// Native recurring-task facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerFamily {
    /// `crontab`-managed job table. Entries lock through `flock(1)`, so
    /// both binaries must be present.
    Cron,
    /// Windows Task Scheduler via `schtasks`.
    TaskScheduler,
}

/// What the host offers to the installer.
#[derive(Debug, Clone)]
pub struct HostCapabilities {
    pub platform: Platform,
    pub elevated: bool,
    pub package_manager: Option<PackageManager>,
    pub scheduler: Option<SchedulerFamily>,
    pub git_available: bool,
    pub tar_available: bool,
}

impl HostCapabilities {
    /// Detect capabilities of the running host.
    pub fn detect() -> Self {
        Self::detect_with(Platform::current(), is_elevated(), &parse_system_path())
    }

    /// Detect against an explicit PATH (for testing).
    pub fn detect_with(platform: Platform, elevated: bool, path: &[PathBuf]) -> Self {
        let has = |tool: &str| resolve_tool_path(tool, path).is_some();

        let package_manager = PackageManager::candidates(platform)
            .iter()
            .copied()
            .find(|pm| has(pm.binary()));

        let scheduler = match platform {
            Platform::Windows if has("schtasks") => Some(SchedulerFamily::TaskScheduler),
            Platform::Linux | Platform::MacOS if has("crontab") && has("flock") => {
                Some(SchedulerFamily::Cron)
            }
            Platform::Linux | Platform::MacOS if has("crontab") => {
                tracing::warn!("crontab found but flock is missing; cron jobs cannot be locked");
                None
            }
            _ => None,
        };

        let caps = Self {
            platform,
            elevated,
            package_manager,
            scheduler,
            git_available: has("git"),
            tar_available: has("tar"),
        };
        tracing::debug!("host capabilities: {:?}", caps);
        caps
    }
}
