//! Runtime candidates and their validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Result, SetupError};
use crate::shell::{is_executable, CommandRunner, Invocation};

/// Which resolution strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Launcher,
    Registry,
    KnownLocation,
    BoundedScan,
    SearchPath,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Launcher => "launcher",
            StrategyKind::Registry => "registry",
            StrategyKind::KnownLocation => "known-location",
            StrategyKind::BoundedScan => "bounded-scan",
            StrategyKind::SearchPath => "search-path",
        };
        f.write_str(name)
    }
}

/// A `major.minor.patch` runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RuntimeVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for RuntimeVersion {
    type Err = String;

    /// Accepts `3`, `3.10` or `3.10.4`; missing parts are zero.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = |name: &str, required: bool| -> std::result::Result<u32, String> {
            match parts.next() {
                Some(p) => p
                    .parse::<u32>()
                    .map_err(|_| format!("invalid {} component in version '{}'", name, s)),
                None if required => Err(format!("empty version '{}'", s)),
                None => Ok(0),
            }
        };
        let major = next("major", true)?;
        let minor = next("minor", false)?;
        let patch = next("patch", false)?;
        Ok(Self::new(major, minor, patch))
    }
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").unwrap());

/// Pull the first `major.minor.patch` out of a version probe's output.
pub fn parse_version_output(output: &str) -> Option<RuntimeVersion> {
    let caps = VERSION_RE.captures(output)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    Some(RuntimeVersion::new(num(1)?, num(2)?, num(3)?))
}

/// Whether `path` is an OS shell-integration forwarding stub.
///
/// App-execution aliases under `WindowsApps` open a store dialog instead of
/// running, so nothing below such a directory is ever accepted.
pub fn is_stub(path: &Path) -> bool {
    // Split on both separators so Windows paths are recognized on any host.
    path.to_string_lossy()
        .split(['/', '\\'])
        .any(|segment| segment.eq_ignore_ascii_case("WindowsApps"))
}

/// A discovered interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCandidate {
    pub path: PathBuf,
    pub version: Option<RuntimeVersion>,
    pub source: StrategyKind,
    pub validated: bool,
}

impl RuntimeCandidate {
    /// An unprobed candidate.
    pub fn unvalidated(path: impl Into<PathBuf>, source: StrategyKind) -> Self {
        Self {
            path: path.into(),
            version: None,
            source,
            validated: false,
        }
    }
}

/// How long a `--version` probe may take.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Validate a proposed interpreter path against `floor`.
///
/// The path must exist, be executable, not be a stub, and report a
/// parseable version at or above the floor.
pub fn validate(
    runner: &dyn CommandRunner,
    path: &Path,
    source: StrategyKind,
    floor: RuntimeVersion,
) -> Result<RuntimeCandidate> {
    if is_stub(path) {
        return Err(SetupError::NoRuntimeFound {
            floor: floor.to_string(),
            message: format!("{} is a shell-integration stub", path.display()),
        });
    }
    if !path.is_file() || !is_executable(path) {
        return Err(SetupError::NoRuntimeFound {
            floor: floor.to_string(),
            message: format!("{} does not exist or is not executable", path.display()),
        });
    }

    let probe = Invocation::new(path.to_string_lossy())
        .arg("--version")
        .timeout(PROBE_TIMEOUT);
    let result = runner.run(&probe)?;
    let output = result.combined_output();

    let version = parse_version_output(&output).ok_or_else(|| SetupError::ParseError {
        path: path.to_path_buf(),
        output: output.trim().to_string(),
    })?;

    if version.cmp(&floor) == Ordering::Less {
        return Err(SetupError::VersionTooLow {
            path: path.to_path_buf(),
            found: version.to_string(),
            floor: floor.to_string(),
        });
    }

    Ok(RuntimeCandidate {
        path: path.to_path_buf(),
        version: Some(version),
        source,
        validated: true,
    })
}
