//! HTTP artifact downloads.
//!
//! Every download is hashed with SHA-256. The digest is logged, and checked
//! when the caller pins one.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Downloads installers, bundles and source archives.
pub struct Downloader {
    client: Client,
    timeout: Duration,
}

/// A completed download.
#[derive(Debug, Clone)]
pub struct Download {
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the artifact.
    pub sha256: String,
    /// Size in bytes.
    pub size: u64,
}

impl Downloader {
    /// Create a downloader with a 10-minute timeout (runtime installers are large).
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(600))
    }

    /// Create a downloader with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("mtr-setup/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, timeout }
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `url` into `dest`, verifying `expected_sha256` when given.
    ///
    /// A digest mismatch fails before anything is written to `dest`.
    pub fn download(&self, url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<Download> {
        debug!("Downloading {} -> {}", url, dest.display());
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("reading body of {}", url))?;
        let sha256 = sha256_hex(&bytes);

        if let Some(expected) = expected_sha256 {
            if !expected.eq_ignore_ascii_case(&sha256) {
                bail!(
                    "checksum mismatch for {}: expected {}, got {}",
                    url,
                    expected,
                    sha256
                );
            }
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;

        info!("Downloaded {} ({} bytes, sha256 {})", url, bytes.len(), sha256);
        Ok(Download {
            path: dest.to_path_buf(),
            sha256,
            size: bytes.len() as u64,
        })
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
