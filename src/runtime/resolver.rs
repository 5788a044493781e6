//! The ordered fallback chain.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SetupError};

use super::candidate::{validate, RuntimeCandidate, RuntimeVersion};
use super::strategy::{default_chain, ProbeContext, ResolutionStrategy};

/// Interpreter names Windows installs as app-execution aliases.
const ALIAS_NAMES: [&str; 2] = ["python.exe", "python3.exe"];

/// Runs strategies in priority order; the first validated proposal wins.
pub struct RuntimeResolver<'a> {
    ctx: ProbeContext<'a>,
    chain: Vec<Box<dyn ResolutionStrategy>>,
    floor: RuntimeVersion,
}

impl<'a> RuntimeResolver<'a> {
    pub fn new(ctx: ProbeContext<'a>, floor: RuntimeVersion) -> Self {
        Self::with_chain(ctx, default_chain(), floor)
    }

    /// Use a custom chain (for testing).
    pub fn with_chain(
        ctx: ProbeContext<'a>,
        chain: Vec<Box<dyn ResolutionStrategy>>,
        floor: RuntimeVersion,
    ) -> Self {
        Self { ctx, chain, floor }
    }

    pub fn floor(&self) -> RuntimeVersion {
        self.floor
    }

    pub fn context(&self) -> &ProbeContext<'a> {
        &self.ctx
    }

    /// Find a validated runtime, or `NoRuntimeFound` with the last reason a
    /// proposal was rejected.
    pub fn resolve(&self) -> Result<RuntimeCandidate> {
        let mut last_rejection = String::from("no strategy proposed a candidate");

        for strategy in &self.chain {
            let kind = strategy.kind();
            let proposals = strategy.propose(&self.ctx);
            debug!("strategy {} proposed {} path(s)", kind, proposals.len());

            for path in proposals {
                match validate(self.ctx.runner, &path, kind, self.floor) {
                    Ok(candidate) => {
                        info!(
                            "Resolved runtime {} via {} ({})",
                            path.display(),
                            kind,
                            candidate
                                .version
                                .map(|v| v.to_string())
                                .unwrap_or_default()
                        );
                        return Ok(candidate);
                    }
                    Err(err) => {
                        warn!("rejected {}: {}", path.display(), err);
                        last_rejection = err.to_string();
                    }
                }
            }
        }

        Err(SetupError::NoRuntimeFound {
            floor: self.floor.to_string(),
            message: last_rejection,
        })
    }
}

/// Delete the `python.exe`/`python3.exe` app-execution aliases from
/// `windows_apps`. Returns the removed paths.
pub fn remove_stubs(windows_apps: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for name in ALIAS_NAMES {
        let alias = windows_apps.join(name);
        if alias.symlink_metadata().is_ok() {
            match fs::remove_file(&alias) {
                Ok(()) => {
                    debug!("removed app-execution alias {}", alias.display());
                    removed.push(alias);
                }
                Err(err) => warn!("could not remove {}: {}", alias.display(), err),
            }
        }
    }
    removed
}

/// The per-user alias directory, `%LOCALAPPDATA%\Microsoft\WindowsApps`.
pub fn windows_apps_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("Microsoft").join("WindowsApps"))
}
