//! Narrow interface over the host package catalog.

use crate::error::Result;
use crate::shell::{run_checked, run_succeeds, CommandRunner, Invocation};

use super::capabilities::PackageManager;

/// Queries and installs system packages through the detected manager.
pub struct HostPackages<'a> {
    manager: PackageManager,
    runner: &'a dyn CommandRunner,
}

impl<'a> HostPackages<'a> {
    pub fn new(manager: PackageManager, runner: &'a dyn CommandRunner) -> Self {
        Self { manager, runner }
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    /// Whether `package` is already installed.
    pub fn query_installed(&self, package: &str) -> bool {
        let inv = match self.manager {
            PackageManager::AptGet => Invocation::new("dpkg").args(["-s", package]),
            PackageManager::Dnf | PackageManager::Yum | PackageManager::Zypper => {
                Invocation::new("rpm").args(["-q", package])
            }
            PackageManager::Pacman => Invocation::new("pacman").args(["-Q", package]),
            PackageManager::Apk => Invocation::new("apk").args(["info", "-e", package]),
            PackageManager::Homebrew => Invocation::new("brew").args(["list", "--formula", package]),
            PackageManager::Winget => {
                Invocation::new("winget").args(["list", "--exact", "--id", package])
            }
            PackageManager::Chocolatey => {
                Invocation::new("choco").args(["list", "--exact", "--limit-output", package])
            }
        };
        run_succeeds(self.runner, &inv)
    }

    /// Install every package in `packages` that is not already present.
    ///
    /// Returns the packages that were actually requested from the manager.
    pub fn install(&self, packages: &[&str]) -> Result<Vec<String>> {
        let missing: Vec<String> = packages
            .iter()
            .filter(|p| !self.query_installed(p))
            .map(|p| p.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(missing);
        }

        if self.manager == PackageManager::AptGet {
            // Stale indexes are the usual reason apt cannot find python3-venv.
            let _ = self.runner.run(&Invocation::new("apt-get").arg("update"));
        }

        let inv = install_invocation(self.manager, &missing);
        tracing::info!("installing system packages: {}", missing.join(" "));
        run_checked(self.runner, &inv)?;
        Ok(missing)
    }
}

/// Non-interactive install command for a manager.
pub fn install_invocation(manager: PackageManager, packages: &[String]) -> Invocation {
    let base = match manager {
        PackageManager::AptGet => Invocation::new("apt-get")
            .args(["install", "-y"])
            .env("DEBIAN_FRONTEND", "noninteractive"),
        PackageManager::Dnf => Invocation::new("dnf").args(["install", "-y"]),
        PackageManager::Yum => Invocation::new("yum").args(["install", "-y"]),
        PackageManager::Pacman => Invocation::new("pacman").args(["-S", "--noconfirm", "--needed"]),
        PackageManager::Zypper => {
            Invocation::new("zypper").args(["--non-interactive", "install"])
        }
        PackageManager::Apk => Invocation::new("apk").args(["add", "--no-cache"]),
        PackageManager::Homebrew => Invocation::new("brew").arg("install"),
        PackageManager::Winget => Invocation::new("winget").args([
            "install",
            "--silent",
            "--accept-package-agreements",
            "--accept-source-agreements",
            "--exact",
            "--id",
        ]),
        PackageManager::Chocolatey => Invocation::new("choco").args(["install", "-y"]),
    };
    base.args(packages.iter().cloned())
}

/// Package names providing a runtime with venv and pip support.
pub fn runtime_packages(manager: PackageManager) -> &'static [&'static str] {
    match manager {
        PackageManager::AptGet => &["python3", "python3-venv", "python3-pip"],
        PackageManager::Dnf | PackageManager::Yum => &["python3", "python3-pip"],
        PackageManager::Pacman => &["python", "python-pip"],
        PackageManager::Zypper => &["python3", "python3-pip"],
        PackageManager::Apk => &["python3", "py3-pip"],
        PackageManager::Homebrew => &["python@3.12"],
        PackageManager::Winget => &["Python.Python.3.12"],
        PackageManager::Chocolatey => &["python312"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockResponse, MockRunner};

    #[test]
    fn install_skips_present_packages() {
        let runner = MockRunner::new();
        runner.on("dpkg -s python3", MockResponse::ok("Status: install ok installed"));
        runner.on("dpkg -s python3-venv", MockResponse::fail(1, "not installed"));
        runner.on("apt-get", MockResponse::ok(""));

        let packages = HostPackages::new(PackageManager::AptGet, &runner);
        let installed = packages.install(&["python3", "python3-venv"]).unwrap();

        assert_eq!(installed, vec!["python3-venv".to_string()]);
        assert!(runner.was_called("apt-get update"));
        assert!(runner.was_called("apt-get install -y python3-venv"));
        assert!(!runner.was_called("apt-get install -y python3 "));
    }

    #[test]
    fn install_is_noop_when_everything_present() {
        let runner = MockRunner::new();
        runner.on("rpm -q", MockResponse::ok("python3-3.11"));

        let packages = HostPackages::new(PackageManager::Dnf, &runner);
        assert!(packages.install(&["python3"]).unwrap().is_empty());
        assert!(!runner.was_called("dnf"));
    }

    #[test]
    fn failed_install_is_command_failed() {
        let runner = MockRunner::new();
        runner.on("pacman -Q", MockResponse::fail(1, ""));
        runner.on("pacman -S", MockResponse::fail(1, "error: target not found"));

        let packages = HostPackages::new(PackageManager::Pacman, &runner);
        let err = packages.install(&["python"]).unwrap_err();
        assert_eq!(err.diagnostic_tail(), Some("error: target not found"));
    }

    #[test]
    fn apt_install_is_noninteractive() {
        let inv = install_invocation(PackageManager::AptGet, &["python3".to_string()]);
        assert_eq!(inv.display(), "apt-get install -y python3");
        assert_eq!(
            inv.options.env.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
    }

    #[test]
    fn runtime_packages_include_venv_on_debian() {
        assert!(runtime_packages(PackageManager::AptGet).contains(&"python3-venv"));
    }
}
