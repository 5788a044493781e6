//! Git operations over a [`CommandRunner`].

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::shell::{run_checked, CommandRunner, Invocation};

/// Thin git client. Every operation is one `git` invocation.
pub struct GitClient<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> GitClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Whether `dir` is the top of a git checkout.
    pub fn is_checkout(&self, dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    /// Shallow clone of a single branch.
    pub fn clone_shallow(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let inv = Invocation::new("git").args([
            "clone",
            "--depth",
            "1",
            "--branch",
            branch,
            url,
            &dest.to_string_lossy(),
        ]);
        run_checked(self.runner, &inv)?;
        Ok(())
    }

    /// Point `origin` at `url`, adding the remote if it is missing.
    pub fn set_origin(&self, dir: &Path, url: &str) -> Result<()> {
        let set = Invocation::new("git")
            .args(["remote", "set-url", "origin", url])
            .cwd(dir);
        if self.runner.run(&set)?.success {
            return Ok(());
        }
        debug!("No origin remote in {}, adding one", dir.display());
        let add = Invocation::new("git")
            .args(["remote", "add", "origin", url])
            .cwd(dir);
        run_checked(self.runner, &add)?;
        Ok(())
    }

    /// Fetch the tip of `branch` only.
    pub fn fetch_shallow(&self, dir: &Path, branch: &str) -> Result<()> {
        let inv = Invocation::new("git")
            .args(["fetch", "--depth", "1", "origin", branch])
            .cwd(dir);
        run_checked(self.runner, &inv)?;
        Ok(())
    }

    /// Discard local state in favor of `rev`.
    pub fn reset_hard(&self, dir: &Path, rev: &str) -> Result<()> {
        let inv = Invocation::new("git")
            .args(["reset", "--hard", rev])
            .cwd(dir);
        run_checked(self.runner, &inv)?;
        Ok(())
    }

    /// Remove untracked and ignored files.
    pub fn clean(&self, dir: &Path) -> Result<()> {
        let inv = Invocation::new("git").args(["clean", "-fdx"]).cwd(dir);
        run_checked(self.runner, &inv)?;
        Ok(())
    }

    /// SHA of `HEAD`, if it can be read.
    pub fn head_sha(&self, dir: &Path) -> Option<String> {
        let inv = Invocation::new("git").args(["rev-parse", "HEAD"]).cwd(dir);
        match self.runner.run(&inv) {
            Ok(result) if result.success => {
                let sha = result.stdout.trim().to_string();
                (!sha.is_empty()).then_some(sha)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockResponse, MockRunner};
    use tempfile::TempDir;

    #[test]
    fn set_origin_falls_back_to_add() {
        let runner = MockRunner::new();
        runner.on("git remote set-url", MockResponse::fail(2, "No such remote 'origin'"));
        runner.on("git remote add", MockResponse::ok(""));

        let temp = TempDir::new().unwrap();
        GitClient::new(&runner)
            .set_origin(temp.path(), "https://example.com/r.git")
            .unwrap();
        assert!(runner.was_called("git remote add origin https://example.com/r.git"));
    }

    #[test]
    fn fetch_failure_carries_output_tail() {
        let runner = MockRunner::new();
        runner.on(
            "git fetch",
            MockResponse::fail(128, "fatal: couldn't find remote ref nope"),
        );

        let temp = TempDir::new().unwrap();
        let err = GitClient::new(&runner)
            .fetch_shallow(temp.path(), "nope")
            .unwrap_err();
        assert_eq!(
            err.diagnostic_tail(),
            Some("fatal: couldn't find remote ref nope")
        );
    }

    #[test]
    fn head_sha_trims_output() {
        let runner = MockRunner::new();
        runner.on("git rev-parse HEAD", MockResponse::ok("abc123\n"));
        let temp = TempDir::new().unwrap();
        assert_eq!(
            GitClient::new(&runner).head_sha(temp.path()),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn head_sha_none_when_git_fails() {
        let runner = MockRunner::new();
        let temp = TempDir::new().unwrap();
        assert_eq!(GitClient::new(&runner).head_sha(temp.path()), None);
    }

    #[test]
    fn is_checkout_looks_for_dot_git() {
        let runner = MockRunner::new();
        let temp = TempDir::new().unwrap();
        let git = GitClient::new(&runner);
        assert!(!git.is_checkout(temp.path()));
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(git.is_checkout(temp.path()));
    }
}
