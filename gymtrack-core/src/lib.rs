//! Core logic for gymtrack.
//!
//! # Core Concepts
//!
//! - [`schedule::WeeklySchedule`]: the fixed weekly plan. One [`schedule::DayWorkout`]
//!   per weekday, each split into warmup, strength and cardio phases. The rest
//!   day has no exercises at all.
//! - [`workout::WorkoutMachine`]: the session state machine. A value object whose
//!   transitions return new snapshots plus any [`workout::Effect`] the caller must
//!   hand to the persistence layer.
//! - [`timer::Countdown`]: the per-exercise countdown the machine ticks once a second.
//! - [`stats::ActivitySummary`]: streaks and the 84-day heatmap reduced from
//!   completed sessions.
//! - [`models`]: wire and storage records shared by the server and its clients.

pub mod error;
pub mod models;
pub mod schedule;
pub mod stats;
pub mod timer;
pub mod workout;

pub use error::WorkoutError;
