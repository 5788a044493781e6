//! Unattended runtime installation.
//!
//! Unix hosts install through the package manager. Windows hosts run the
//! pinned installer system-wide, then per-user, and fall back to the
//! embeddable bundle when the installer cannot be downloaded.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Result, SetupError};
use crate::fetch::Downloader;
use crate::host::{runtime_packages, HostPackages, PackageManager};
use crate::shell::{run_checked, tail_lines, CommandRunner, Invocation, Platform, TAIL_LINES};

use super::candidate::{validate, RuntimeCandidate, StrategyKind};
use super::resolver::RuntimeResolver;

/// Pinned runtime release.
pub const PINNED_VERSION: &str = "3.12.6";

const INSTALLER_TIMEOUT: Duration = Duration::from_secs(1800);
const PIP_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(600);

/// Where installers and bundles come from.
#[derive(Debug, Clone)]
pub struct RuntimeSources {
    pub installer_url: String,
    pub installer_sha256: Option<String>,
    pub bundle_url: String,
    pub bundle_sha256: Option<String>,
    pub get_pip_url: String,
}

impl Default for RuntimeSources {
    fn default() -> Self {
        let base = format!("https://www.python.org/ftp/python/{PINNED_VERSION}");
        Self {
            installer_url: format!("{base}/python-{PINNED_VERSION}-amd64.exe"),
            installer_sha256: None,
            bundle_url: format!("{base}/python-{PINNED_VERSION}-embed-amd64.zip"),
            bundle_sha256: None,
            get_pip_url: "https://bootstrap.pypa.io/get-pip.py".to_string(),
        }
    }
}

/// Installer scope on Windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    AllUsers,
    CurrentUser,
}

/// Arguments for an unattended run of the Windows installer.
pub fn installer_args(scope: InstallScope, log: &Path) -> Vec<String> {
    let all_users = match scope {
        InstallScope::AllUsers => "InstallAllUsers=1",
        InstallScope::CurrentUser => "InstallAllUsers=0",
    };
    vec![
        "/quiet".to_string(),
        all_users.to_string(),
        "PrependPath=1".to_string(),
        "Include_pip=1".to_string(),
        "/log".to_string(),
        log.to_string_lossy().into_owned(),
    ]
}

/// Force-enable `import site` in an embeddable bundle's `._pth` file.
///
/// Bundles ship with the line commented out, which stops pip from importing.
pub fn enable_site_import(pth: &str) -> String {
    let mut found = false;
    let mut lines: Vec<String> = pth
        .lines()
        .map(|line| {
            let stripped = line.trim_start_matches('#').trim();
            if stripped == "import site" {
                found = true;
                "import site".to_string()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !found {
        lines.push("import site".to_string());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Installs a runtime when resolution finds none.
pub struct RuntimeInstaller<'a> {
    runner: &'a dyn CommandRunner,
    downloader: &'a Downloader,
    platform: Platform,
    package_manager: Option<PackageManager>,
    work_dir: PathBuf,
    bundle_dir: PathBuf,
    sources: RuntimeSources,
}

impl<'a> RuntimeInstaller<'a> {
    /// `work_dir` receives downloads and installer logs; `bundle_dir` is
    /// where an embeddable bundle is expanded.
    pub fn new(
        runner: &'a dyn CommandRunner,
        downloader: &'a Downloader,
        platform: Platform,
        package_manager: Option<PackageManager>,
        work_dir: impl Into<PathBuf>,
        bundle_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            downloader,
            platform,
            package_manager,
            work_dir: work_dir.into(),
            bundle_dir: bundle_dir.into(),
            sources: RuntimeSources::default(),
        }
    }

    pub fn with_sources(mut self, sources: RuntimeSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    /// Install a runtime and re-resolve through `resolver`.
    pub fn install_and_resolve(&self, resolver: &RuntimeResolver) -> Result<RuntimeCandidate> {
        if self.platform.is_windows() {
            self.install_windows(resolver)
        } else {
            self.install_packages(resolver)
        }
    }

    fn no_runtime(&self, resolver: &RuntimeResolver, message: impl Into<String>) -> SetupError {
        SetupError::NoRuntimeFound {
            floor: resolver.floor().to_string(),
            message: message.into(),
        }
    }

    fn install_packages(&self, resolver: &RuntimeResolver) -> Result<RuntimeCandidate> {
        let Some(manager) = self.package_manager else {
            return Err(self.no_runtime(resolver, "no supported package manager to install one"));
        };
        let installed = HostPackages::new(manager, self.runner).install(runtime_packages(manager))?;
        info!("Installed runtime packages via {}: {:?}", manager.binary(), installed);
        resolver.resolve()
    }

    fn install_windows(&self, resolver: &RuntimeResolver) -> Result<RuntimeCandidate> {
        fs::create_dir_all(&self.work_dir)?;
        let installer = self.work_dir.join(format!("python-{PINNED_VERSION}-amd64.exe"));

        if let Err(err) = self.downloader.download(
            &self.sources.installer_url,
            &installer,
            self.sources.installer_sha256.as_deref(),
        ) {
            warn!("Runtime installer unavailable ({err:#}); using the embeddable bundle");
            return self.install_bundle(resolver);
        }

        let mut last_failure: Option<SetupError> = None;
        for scope in [InstallScope::AllUsers, InstallScope::CurrentUser] {
            match self.run_installer(&installer, scope) {
                Ok(()) => match resolver.resolve() {
                    Ok(candidate) => return Ok(candidate),
                    Err(err) => {
                        warn!("Installer ({scope:?}) finished but no runtime resolved");
                        last_failure = Some(err);
                    }
                },
                Err(err) => {
                    warn!("Installer ({scope:?}) failed: {err}");
                    last_failure = Some(err);
                }
            }
        }

        Err(last_failure
            .unwrap_or_else(|| self.no_runtime(resolver, "runtime installer produced nothing")))
    }

    fn run_installer(&self, installer: &Path, scope: InstallScope) -> Result<()> {
        let tag = match scope {
            InstallScope::AllUsers => "allusers",
            InstallScope::CurrentUser => "user",
        };
        let log = self.work_dir.join(format!("python-install-{tag}.log"));
        let inv = Invocation::new(installer.to_string_lossy())
            .args(installer_args(scope, &log))
            .timeout(INSTALLER_TIMEOUT);

        let result = self.runner.run(&inv)?;
        if result.success {
            return Ok(());
        }

        // The installer writes its diagnostics to the log, not to stdout.
        let log_text = fs::read(&log)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| result.combined_output());
        Err(SetupError::CommandFailed {
            command: inv.display(),
            code: result.exit_code,
            output_tail: tail_lines(&log_text, TAIL_LINES),
        })
    }

    /// Expand the embeddable bundle, enable site imports and bootstrap pip.
    pub fn install_bundle(&self, resolver: &RuntimeResolver) -> Result<RuntimeCandidate> {
        let zip = self.work_dir.join(format!("python-{PINNED_VERSION}-embed-amd64.zip"));
        self.downloader
            .download(&self.sources.bundle_url, &zip, self.sources.bundle_sha256.as_deref())
            .map_err(|e| self.no_runtime(resolver, format!("bundle download failed: {e:#}")))?;

        fs::create_dir_all(&self.bundle_dir)?;
        let expand = Invocation::new("tar").args([
            "-xf",
            &zip.to_string_lossy(),
            "-C",
            &self.bundle_dir.to_string_lossy(),
        ]);
        run_checked(self.runner, &expand)?;

        self.patch_pth_files()?;
        self.bootstrap_pip()?;

        let python = bundle_python(&self.bundle_dir);
        validate(self.runner, &python, StrategyKind::KnownLocation, resolver.floor())
    }

    fn patch_pth_files(&self) -> Result<()> {
        let mut patched = 0;
        for entry in fs::read_dir(&self.bundle_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "_pth") {
                let content = fs::read_to_string(&path)?;
                fs::write(&path, enable_site_import(&content))?;
                patched += 1;
            }
        }
        if patched == 0 {
            warn!("no ._pth file in {}", self.bundle_dir.display());
        }
        Ok(())
    }

    /// Run get-pip.py with the bundle interpreter and check pip answers.
    /// Also used to re-bootstrap a bundle whose pip went missing.
    pub fn bootstrap_pip(&self) -> Result<()> {
        let get_pip = self.bundle_dir.join("get-pip.py");
        self.downloader
            .download(&self.sources.get_pip_url, &get_pip, None)
            .map_err(SetupError::Other)?;

        let python = bundle_python(&self.bundle_dir);
        let bootstrap = Invocation::new(python.to_string_lossy())
            .arg(get_pip.to_string_lossy())
            .arg("--no-warn-script-location")
            .timeout(PIP_BOOTSTRAP_TIMEOUT);
        run_checked(self.runner, &bootstrap)?;

        let liveness = Invocation::new(python.to_string_lossy()).args(["-m", "pip", "--version"]);
        run_checked(self.runner, &liveness)?;
        Ok(())
    }
}

/// Interpreter inside an embeddable bundle.
pub fn bundle_python(bundle_dir: &Path) -> PathBuf {
    bundle_dir.join("python.exe")
}
