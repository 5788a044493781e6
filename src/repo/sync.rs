//! Clone-or-update of the source checkout.
//!
//! Postcondition: the checkout matches the remote tip of the branch and
//! contains the manifest marker. Local changes are discarded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SetupError};
use crate::fetch::{Downloader, GitClient};
use crate::shell::CommandRunner;

use super::archive::{archive_url, fetch_and_expand};

/// How the checkout was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMethod {
    Clone,
    Update,
    Archive,
}

/// Result of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub path: PathBuf,
    pub method: SyncMethod,
    /// Commit SHA, when the checkout is a git repository.
    pub commit: Option<String>,
}

/// Synchronizes `install_root/src` with a remote branch.
pub struct RepoSynchronizer<'a> {
    runner: &'a dyn CommandRunner,
    downloader: &'a Downloader,
    git_available: bool,
}

impl<'a> RepoSynchronizer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, downloader: &'a Downloader, git_available: bool) -> Self {
        Self {
            runner,
            downloader,
            git_available,
        }
    }

    /// Bring `dest` to the tip of `branch` of `url` and check for `marker`.
    pub fn sync(&self, url: &str, branch: &str, dest: &Path, marker: &str) -> Result<SyncOutcome> {
        let fail = |message: String| SetupError::RepoSyncFailed {
            url: url.to_string(),
            branch: branch.to_string(),
            message,
        };

        let (method, commit) = if self.git_available {
            let method = self
                .sync_git(url, branch, dest)
                .map_err(|e| fail(describe(&e)))?;
            (method, GitClient::new(self.runner).head_sha(dest))
        } else {
            warn!("git not available; falling back to a branch archive");
            let archive = archive_url(url, branch).ok_or_else(|| {
                fail("git is not installed and no archive URL is known for this host".to_string())
            })?;
            let staging = dest.with_file_name(".src-staging");
            fetch_and_expand(self.downloader, self.runner, &archive, &staging, dest)
                .map_err(|e| fail(format!("{e:#}")))?;
            (SyncMethod::Archive, None)
        };

        verify_marker(dest, marker)?;
        info!(
            "Synced {} ({}) into {} via {:?}",
            url,
            branch,
            dest.display(),
            method
        );

        Ok(SyncOutcome {
            path: dest.to_path_buf(),
            method,
            commit,
        })
    }

    fn sync_git(&self, url: &str, branch: &str, dest: &Path) -> Result<SyncMethod> {
        let git = GitClient::new(self.runner);

        if git.is_checkout(dest) {
            debug!("updating existing checkout at {}", dest.display());
            git.set_origin(dest, url)?;
            git.fetch_shallow(dest, branch)?;
            git.reset_hard(dest, "FETCH_HEAD")?;
            git.clean(dest)?;
            return Ok(SyncMethod::Update);
        }

        if dest.exists() {
            // Not a checkout; nothing in it is worth keeping.
            debug!("replacing non-checkout directory {}", dest.display());
            fs::remove_dir_all(dest)?;
        }
        git.clone_shallow(url, branch, dest)?;
        Ok(SyncMethod::Clone)
    }
}

/// Fail with `ManifestMissing` unless `dir/marker` is a file.
pub fn verify_marker(dir: &Path, marker: &str) -> Result<()> {
    if dir.join(marker).is_file() {
        Ok(())
    } else {
        Err(SetupError::ManifestMissing {
            path: dir.to_path_buf(),
            marker: marker.to_string(),
        })
    }
}

/// Error text plus any captured child output.
fn describe(err: &SetupError) -> String {
    match err.diagnostic_tail() {
        Some(tail) => format!("{err}\n{tail}"),
        None => err.to_string(),
    }
}
