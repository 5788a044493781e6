//! Error types for provisioning operations.
//!
//! This module defines [`SetupError`], the primary error type used throughout
//! the installer, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every fatal condition of the install pipeline has its own variant so the
//!   CLI can map it to a stable exit code
//! - Recoverable conditions (a resolution strategy that finds nothing, a
//!   missing `git`) are handled inside the owning component and never
//!   surface here unless every alternative is exhausted
//! - Use `anyhow::Error` (via `SetupError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The installer must run with root/administrator rights.
    #[error("Elevated privileges required: {message}")]
    ElevationRequired { message: String },

    /// No usable language runtime after every strategy and install attempt.
    #[error("No usable Python runtime found (need >= {floor}): {message}")]
    NoRuntimeFound { floor: String, message: String },

    /// The version probe printed something that is not `major.minor.patch`.
    #[error("Could not parse version from '{path}': {output}")]
    ParseError { path: PathBuf, output: String },

    /// The runtime works but is older than the configured floor.
    #[error("Runtime at '{path}' is {found}, need >= {floor}")]
    VersionTooLow {
        path: PathBuf,
        found: String,
        floor: String,
    },

    /// Clone, fetch, reset or archive download failed.
    #[error("Failed to sync {url} ({branch}): {message}")]
    RepoSyncFailed {
        url: String,
        branch: String,
        message: String,
    },

    /// The checkout does not contain the expected manifest marker.
    #[error("Manifest '{marker}' missing in {path}; wrong repository URL or branch?")]
    ManifestMissing { path: PathBuf, marker: String },

    /// The isolated environment's package manager is dead even after a re-bootstrap.
    #[error("Environment at '{path}' is corrupt: {message}")]
    EnvironmentCorrupt { path: PathBuf, message: String },

    /// Answers file not found.
    #[error("Answers file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Answers file is not valid YAML for [`crate::config::DesiredConfig`].
    #[error("Failed to parse answers file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A configuration answer could not be accepted.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The requested schedule cannot be honored.
    #[error("Invalid schedule: {message}")]
    ScheduleInvalid { message: String },

    /// The host has no native recurring-task facility.
    #[error("No usable job scheduler on this host: {message}")]
    SchedulerUnavailable { message: String },

    /// Post-install trial run did not confirm a working install.
    #[error("Self-test inconclusive: {message}")]
    SelfTestInconclusive { message: String },

    /// A child process failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Last lines of the child's output, shown before abort.
        output_tail: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SetupError {
    /// Process exit code for this error.
    ///
    /// `2` is reserved for schedule validation; every other fatal condition
    /// exits `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::ScheduleInvalid { .. } => 2,
            _ => 1,
        }
    }

    /// Diagnostic context worth showing before abort, if any.
    pub fn diagnostic_tail(&self) -> Option<&str> {
        match self {
            SetupError::CommandFailed { output_tail, .. } if !output_tail.trim().is_empty() => {
                Some(output_tail)
            }
            _ => None,
        }
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_invalid_exits_two() {
        let err = SetupError::ScheduleInvalid {
            message: "7 does not divide 60".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("7 does not divide 60"));
    }

    #[test]
    fn elevation_and_manifest_exit_one() {
        let err = SetupError::ElevationRequired {
            message: "run as root".into(),
        };
        assert_eq!(err.exit_code(), 1);

        let err = SetupError::ManifestMissing {
            path: PathBuf::from("/opt/mtr-logger/src"),
            marker: "pyproject.toml".into(),
        };
        assert_eq!(err.exit_code(), 1);
        let msg = err.to_string();
        assert!(msg.contains("pyproject.toml"));
        assert!(msg.contains("/opt/mtr-logger/src"));
    }

    #[test]
    fn version_too_low_displays_found_and_floor() {
        let err = SetupError::VersionTooLow {
            path: PathBuf::from("/usr/bin/python3"),
            found: "3.6.9".into(),
            floor: "3.8.0".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3.6.9"));
        assert!(msg.contains("3.8.0"));
    }

    #[test]
    fn command_failed_exposes_tail() {
        let err = SetupError::CommandFailed {
            command: "pip install -e .".into(),
            code: Some(1),
            output_tail: "error: no matching distribution".into(),
        };
        assert_eq!(err.diagnostic_tail(), Some("error: no matching distribution"));
    }

    #[test]
    fn blank_tail_is_not_diagnostic() {
        let err = SetupError::CommandFailed {
            command: "git fetch".into(),
            code: Some(128),
            output_tail: "  \n".into(),
        };
        assert!(err.diagnostic_tail().is_none());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
