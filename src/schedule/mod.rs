//! Schedule calculation.
//!
//! A pure function of logs-per-hour and a safety margin. It runs before any
//! host mutation, so an invalid schedule never leaves anything behind.
//!
//! # Example
//!
//! ```
//! use mtr_setup::schedule::ScheduleSpec;
//!
//! let spec = ScheduleSpec::compute(4, 5).unwrap();
//! assert_eq!(spec.minute_marks, vec![0, 15, 30, 45]);
//! assert_eq!(spec.duration_seconds, 895);
//!
//! assert!(ScheduleSpec::compute(7, 5).is_err());
//! ```

pub mod calculator;

pub use calculator::{ScheduleSpec, VALID_LOGS_PER_HOUR};
