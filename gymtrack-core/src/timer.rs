//! Per-exercise countdown.

use serde::{Deserialize, Serialize};

/// Outcome of a single one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    Expired,
}

/// A fixed-length countdown measured in whole seconds.
///
/// The countdown holds no clock of its own: whoever owns it calls [`Countdown::tick`]
/// once per elapsed second, which keeps tests on virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Count down one second. Reaching zero reports [`Tick::Expired`] exactly once
    /// per countdown; further ticks are ignored.
    pub fn tick(&mut self) -> Tick {
        if self.remaining == 0 {
            return Tick::Running;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Running
        }
    }

    /// Fraction of the countdown already spent, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        f64::from(self.duration - self.remaining) / f64::from(self.duration)
    }

    /// Remaining time as `mm:ss`.
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Format whole seconds as `mm:ss`. Minutes are not wrapped at an hour.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), Tick::Running);
        assert_eq!(countdown.tick(), Tick::Running);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(countdown.is_expired());
    }

    #[test]
    fn expiry_is_reported_once() {
        let mut countdown = Countdown::new(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Running);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn progress_tracks_spent_time() {
        let mut countdown = Countdown::new(60);
        assert_eq!(countdown.progress(), 0.0);
        for _ in 0..15 {
            countdown.tick();
        }
        assert!((countdown.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_length_countdown_has_no_progress() {
        assert_eq!(Countdown::new(0).progress(), 0.0);
    }

    #[test]
    fn displays_minutes_and_seconds() {
        assert_eq!(Countdown::new(375).display(), "06:15");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(2400), "40:00");
    }
}
