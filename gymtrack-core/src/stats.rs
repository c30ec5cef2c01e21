//! Streaks and the activity heatmap.
//!
//! Everything here works on calendar days in one timezone. Callers convert
//! session timestamps to local dates first (see [`CompletedSession::from_summary`]).

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Days, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::SessionSummary;

/// Days shown on the heatmap, twelve weeks ending today.
pub const HEATMAP_DAYS: u64 = 84;

/// How far back streaks are evaluated.
pub const STREAK_WINDOW_DAYS: u64 = 365;

/// A finished session reduced to what the statistics need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedSession {
    pub date: NaiveDate,
    pub duration_secs: u32,
}

impl CompletedSession {
    pub fn new(date: NaiveDate, duration_secs: u32) -> Self {
        Self {
            date,
            duration_secs,
        }
    }

    /// Local calendar day of a history record. Unfinished sessions yield `None`.
    pub fn from_summary(summary: &SessionSummary, offset: &FixedOffset) -> Option<Self> {
        summary.completed.then(|| Self {
            date: summary.date.with_timezone(offset).date_naive(),
            duration_secs: summary.total_duration,
        })
    }

    /// Duration rounded to the nearest whole minute.
    pub fn minutes(&self) -> u32 {
        self.duration_secs / 60 + u32::from(self.duration_secs % 60 >= 30)
    }
}

/// Heatmap intensity for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatTier {
    Empty,
    Lowest,
    Low,
    Medium,
    Highest,
}

impl HeatTier {
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0 => Self::Empty,
            1..=19 => Self::Lowest,
            20..=29 => Self::Low,
            30..=39 => Self::Medium,
            _ => Self::Highest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub minutes: u32,
    pub tier: HeatTier,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u8,
    pub is_today: bool,
}

/// One column of the heatmap grid, Sunday at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapWeek {
    /// Empty slots above the first cell. Only the first week has any.
    pub leading_pad: usize,
    pub days: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub heatmap: Vec<HeatmapCell>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_sessions: u32,
    pub total_minutes: u32,
}

pub fn summarize(sessions: &[CompletedSession], today: NaiveDate, rest_day: Weekday) -> ActivitySummary {
    let workout_days: HashSet<NaiveDate> = sessions.iter().map(|s| s.date).collect();

    ActivitySummary {
        heatmap: heatmap(sessions, today),
        current_streak: current_streak(&workout_days, today, rest_day),
        longest_streak: longest_streak(&workout_days, today, rest_day),
        total_sessions: sessions.len() as u32,
        total_minutes: sessions
            .iter()
            .map(CompletedSession::minutes)
            .fold(0, u32::saturating_add),
    }
}

/// Consecutive workout days ending today, or yesterday if today is still open.
///
/// The rest weekday neither breaks nor extends a run.
pub fn current_streak(workout_days: &HashSet<NaiveDate>, today: NaiveDate, rest_day: Weekday) -> u32 {
    let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
        return 0;
    };

    let mut day = if workout_days.contains(&today) {
        today
    } else if workout_days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    for _ in 0..STREAK_WINDOW_DAYS {
        if workout_days.contains(&day) {
            streak += 1;
        } else if day.weekday() != rest_day {
            break;
        }
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of workout days within the trailing window.
pub fn longest_streak(workout_days: &HashSet<NaiveDate>, today: NaiveDate, rest_day: Weekday) -> u32 {
    let mut longest = 0;
    let mut running = 0;
    for offset in 0..STREAK_WINDOW_DAYS {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        if workout_days.contains(&day) {
            running += 1;
            longest = longest.max(running);
        } else if day.weekday() != rest_day {
            running = 0;
        }
    }
    longest
}

/// The trailing [`HEATMAP_DAYS`] days, oldest first. Minutes from several
/// sessions on the same day add up.
pub fn heatmap(sessions: &[CompletedSession], today: NaiveDate) -> Vec<HeatmapCell> {
    let mut minutes_by_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for session in sessions {
        let minutes = minutes_by_day.entry(session.date).or_default();
        *minutes = minutes.saturating_add(session.minutes());
    }

    (0..HEATMAP_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| {
            let minutes = minutes_by_day.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                minutes,
                tier: HeatTier::from_minutes(minutes),
                weekday: date.weekday().num_days_from_sunday() as u8,
                is_today: date == today,
            }
        })
        .collect()
}

/// Group heatmap cells into Sunday-started week columns.
pub fn weeks(cells: &[HeatmapCell]) -> Vec<HeatmapWeek> {
    let mut weeks = Vec::new();
    let mut current: Vec<HeatmapCell> = Vec::new();

    for (i, cell) in cells.iter().enumerate() {
        current.push(cell.clone());
        if cell.weekday == 6 || i == cells.len() - 1 {
            let leading_pad = if weeks.is_empty() {
                current[0].weekday as usize
            } else {
                0
            };
            weeks.push(HeatmapWeek {
                leading_pad,
                days: std::mem::take(&mut current),
            });
        }
    }
    weeks
}
