//! Isolated environment provisioning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SetupError};
use crate::runtime::{bundle_python, RuntimeCandidate, RuntimeInstaller};
use crate::shell::{run_checked, run_succeeds, CommandRunner, Invocation, Platform};

/// The two supported environment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvKind {
    /// A virtual environment layered on a system runtime.
    Virtualenv,
    /// A self-contained runtime bundle used directly.
    Bundle,
}

/// A ready environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub kind: EnvKind,
    pub root: PathBuf,
    /// Interpreter that runs the installed package.
    pub python: PathBuf,
}

/// Interpreter path inside a virtual environment.
pub fn venv_python(venv_dir: &Path, platform: Platform) -> PathBuf {
    if platform.is_windows() {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}

/// Builds or reuses the environment and installs the package into it.
pub struct EnvironmentProvisioner<'a> {
    runner: &'a dyn CommandRunner,
    platform: Platform,
    bundle_bootstrap: Option<&'a RuntimeInstaller<'a>>,
}

impl<'a> EnvironmentProvisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, platform: Platform) -> Self {
        Self {
            runner,
            platform,
            bundle_bootstrap: None,
        }
    }

    /// Installer used to re-run get-pip.py for a bundle whose pip is dead.
    pub fn with_bundle_bootstrap(mut self, installer: &'a RuntimeInstaller<'a>) -> Self {
        self.bundle_bootstrap = Some(installer);
        self
    }

    /// Produce a working environment for `runtime`. A runtime living under
    /// `bundle_dir` is used as-is; anything else gets a venv at `venv_dir`.
    pub fn prepare(&self, runtime: &RuntimeCandidate, venv_dir: &Path, bundle_dir: &Path) -> Result<Environment> {
        let env = if runtime.path.starts_with(bundle_dir) {
            Environment {
                kind: EnvKind::Bundle,
                root: bundle_dir.to_path_buf(),
                python: bundle_python(bundle_dir),
            }
        } else {
            let python = venv_python(venv_dir, self.platform);
            if python.is_file() {
                debug!("reusing environment at {}", venv_dir.display());
            } else {
                info!("Creating environment at {}", venv_dir.display());
                let create = Invocation::new(runtime.path.to_string_lossy())
                    .args(["-m", "venv", &venv_dir.to_string_lossy()]);
                run_checked(self.runner, &create)?;
            }
            Environment {
                kind: EnvKind::Virtualenv,
                root: venv_dir.to_path_buf(),
                python,
            }
        };

        self.ensure_pip(&env)?;
        Ok(env)
    }

    /// Check pip answers; re-bootstrap once in place if it does not.
    pub fn ensure_pip(&self, env: &Environment) -> Result<()> {
        if self.pip_alive(env) {
            return Ok(());
        }

        warn!("pip in {} is not responding; re-bootstrapping", env.root.display());
        let rebootstrap = match env.kind {
            EnvKind::Virtualenv => {
                let inv = Invocation::new(env.python.to_string_lossy())
                    .args(["-m", "ensurepip", "--upgrade"]);
                run_checked(self.runner, &inv).map(|_| ())
            }
            EnvKind::Bundle => match self.bundle_bootstrap {
                Some(installer) => installer.bootstrap_pip(),
                None => Err(SetupError::EnvironmentCorrupt {
                    path: env.root.clone(),
                    message: "no way to re-bootstrap pip in the bundle".to_string(),
                }),
            },
        };

        if let Err(err) = rebootstrap {
            return Err(SetupError::EnvironmentCorrupt {
                path: env.root.clone(),
                message: format!("re-bootstrap failed: {err}"),
            });
        }

        if self.pip_alive(env) {
            Ok(())
        } else {
            Err(SetupError::EnvironmentCorrupt {
                path: env.root.clone(),
                message: "pip still not responding after re-bootstrap".to_string(),
            })
        }
    }

    fn pip_alive(&self, env: &Environment) -> bool {
        let inv = Invocation::new(env.python.to_string_lossy()).args(["-m", "pip", "--version"]);
        run_succeeds(self.runner, &inv)
    }

    /// Upgrade packaging tooling, then install `src` in editable mode.
    pub fn install_package(&self, env: &Environment, src: &Path) -> Result<()> {
        let python = env.python.to_string_lossy();
        let upgrade = Invocation::new(python.clone()).args([
            "-m",
            "pip",
            "install",
            "--upgrade",
            "pip",
            "setuptools",
            "wheel",
        ]);
        run_checked(self.runner, &upgrade)?;

        let install = Invocation::new(python).args(["-m", "pip", "install", "-e", &src.to_string_lossy()]);
        run_checked(self.runner, &install)?;
        info!("Installed {} into {}", src.display(), env.root.display());
        Ok(())
    }
}
