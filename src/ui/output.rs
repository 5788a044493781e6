//! Output verbosity.
//!
//! | mode    | headers, steps, spinners | outcomes, warnings | errors |
//! |---------|--------------------------|--------------------|--------|
//! | verbose | yes                      | yes                | yes    |
//! | normal  | yes                      | yes                | yes    |
//! | quiet   | no                       | yes                | yes    |
//! | silent  | no                       | no                 | yes    |
//!
//! Verbose differs from normal only in the log level it implies; the
//! failing child's output tail is shown in every mode.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Verbose,
    #[default]
    Normal,
    /// `--quiet`: unattended installs under a provisioning tool.
    Quiet,
    Silent,
}

impl OutputMode {
    /// Headers, `[n/8]` step lines, informational messages and spinners.
    pub fn shows_steps(self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Success lines and warnings (a skipped self-test, a stale PATH).
    pub fn shows_outcomes(self) -> bool {
        !matches!(self, Self::Silent)
    }
}
