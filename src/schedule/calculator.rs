//! Logs-per-hour to schedule arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};

/// Values of logs-per-hour that divide 60 exactly.
pub const VALID_LOGS_PER_HOUR: [u32; 12] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60];

/// A validated, immutable schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Minutes between runs.
    pub step_minutes: u32,
    /// Seconds between run starts.
    pub window_seconds: u32,
    /// Seconds each run probes for; always less than or equal to the window.
    pub duration_seconds: u32,
    /// Minutes past the hour at which a run starts, ascending from 0.
    pub minute_marks: Vec<u32>,
}

impl ScheduleSpec {
    /// Compute the schedule for `logs_per_hour` runs with `safety_margin_sec`
    /// of slack before the next firing.
    ///
    /// `logs_per_hour` must divide 60 and the margin must leave a positive
    /// duration. A zero margin is accepted.
    pub fn compute(logs_per_hour: u32, safety_margin_sec: u32) -> Result<Self> {
        if !VALID_LOGS_PER_HOUR.contains(&logs_per_hour) {
            return Err(SetupError::ScheduleInvalid {
                message: format!(
                    "logs per hour must be one of {:?}, got {}",
                    VALID_LOGS_PER_HOUR, logs_per_hour
                ),
            });
        }

        let step_minutes = 60 / logs_per_hour;
        let window_seconds = step_minutes * 60;
        if safety_margin_sec >= window_seconds {
            return Err(SetupError::ScheduleInvalid {
                message: format!(
                    "safety margin of {}s leaves no time in a {}s window",
                    safety_margin_sec, window_seconds
                ),
            });
        }

        Ok(Self {
            step_minutes,
            window_seconds,
            duration_seconds: window_seconds - safety_margin_sec,
            minute_marks: (0..60).step_by(step_minutes as usize).collect(),
        })
    }

    /// Number of runs per hour.
    pub fn runs_per_hour(&self) -> usize {
        self.minute_marks.len()
    }

    /// Comma-joined minute marks, as a cron minute field.
    pub fn minute_field(&self) -> String {
        self.minute_marks
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
