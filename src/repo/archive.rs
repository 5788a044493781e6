//! Branch archives for hosts without git.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use crate::fetch::Downloader;
use crate::shell::{run_checked, CommandRunner, Invocation};

/// Code hosting providers with a known archive URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    GitLab,
}

/// Split a clone URL into `(provider, owner, repo)`.
///
/// Accepts `https://host/owner/repo(.git)` and `git@host:owner/repo(.git)`.
pub fn parse_repo_url(url: &str) -> Option<(Provider, String, String)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .map(|r| r.to_string())
        .or_else(|| url.strip_prefix("git@").map(|r| r.replacen(':', "/", 1)))?;

    let mut parts = rest.trim_end_matches('/').splitn(2, '/');
    let host = parts.next()?.to_ascii_lowercase();
    let path = parts.next()?.trim_end_matches(".git");

    let provider = match host.as_str() {
        "github.com" | "www.github.com" => Provider::GitHub,
        "gitlab.com" | "www.gitlab.com" => Provider::GitLab,
        _ => return None,
    };

    let (owner, repo) = path.rsplit_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((provider, owner.to_string(), repo.to_string()))
}

/// Tarball URL for `branch` of the repository at `url`.
pub fn archive_url(url: &str, branch: &str) -> Option<String> {
    let (provider, owner, repo) = parse_repo_url(url)?;
    Some(match provider {
        Provider::GitHub => format!(
            "https://github.com/{owner}/{repo}/archive/refs/heads/{branch}.tar.gz"
        ),
        Provider::GitLab => format!(
            "https://gitlab.com/{owner}/{repo}/-/archive/{branch}/{repo}-{}.tar.gz",
            branch.replace('/', "-")
        ),
    })
}

/// Download `archive` and expand it so that `dest` holds the archive's
/// single top-level directory. `staging` is scratch space, emptied first.
pub fn fetch_and_expand(
    downloader: &Downloader,
    runner: &dyn CommandRunner,
    archive: &str,
    staging: &Path,
    dest: &Path,
) -> Result<()> {
    if staging.exists() {
        fs::remove_dir_all(staging)
            .with_context(|| format!("clearing {}", staging.display()))?;
    }
    let extract = staging.join("extract");
    fs::create_dir_all(&extract)?;

    let tarball = staging.join("source.tar.gz");
    downloader.download(archive, &tarball, None)?;

    let inv = Invocation::new("tar").args([
        "-xzf",
        &tarball.to_string_lossy(),
        "-C",
        &extract.to_string_lossy(),
    ]);
    run_checked(runner, &inv).map_err(|e| anyhow!("{e}"))?;

    let top = single_top_level_dir(&extract)?;
    if dest.exists() {
        fs::remove_dir_all(dest).with_context(|| format!("removing {}", dest.display()))?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&top, dest)
        .with_context(|| format!("moving {} to {}", top.display(), dest.display()))?;
    fs::remove_dir_all(staging).ok();
    Ok(())
}

fn single_top_level_dir(dir: &Path) -> Result<PathBuf> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => bail!(
            "expected one top-level directory in archive, found {} entries",
            entries.len()
        ),
    }
}
