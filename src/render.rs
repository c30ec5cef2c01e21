//! Plain-text rendering for the terminal commands.

use chrono::Weekday;

use crate::schedule::weekday_name;
use crate::stats::{weeks, ActivitySummary, HeatTier, HeatmapCell};
use crate::timer::format_clock;
use crate::workout::{SessionState, WorkoutMachine};

const EMPTY: char = '·';
const LOWEST: char = '░';
const LOW: char = '▒';
const MEDIUM: char = '▓';
const HIGHEST: char = '█';

const ROW_LABELS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn tier_symbol(tier: HeatTier) -> char {
    match tier {
        HeatTier::Empty => EMPTY,
        HeatTier::Lowest => LOWEST,
        HeatTier::Low => LOW,
        HeatTier::Medium => MEDIUM,
        HeatTier::Highest => HIGHEST,
    }
}

/// Render the heatmap as a grid with one column per week, Sunday on top.
///
/// ```text
/// Sun   · ·
/// Mon   █ ·
/// Tue ·   ▒
/// ```
pub fn render_heatmap(cells: &[HeatmapCell]) -> String {
    let columns = weeks(cells);
    let mut output = String::new();

    for (row, weekday) in ROW_LABELS.iter().enumerate() {
        output.push_str(&weekday_name(*weekday)[..3]);
        for week in &columns {
            output.push(' ');
            let cell = row
                .checked_sub(week.leading_pad)
                .and_then(|slot| week.days.get(slot));
            match cell {
                Some(cell) => output.push(tier_symbol(cell.tier)),
                None => output.push(' '),
            }
        }
        output.push('\n');
    }
    output
}

pub fn render_summary(summary: &ActivitySummary) -> String {
    let mut output = render_heatmap(&summary.heatmap);
    output.push_str(&format!(
        "\nLess {} {} {} {} {} More\n\n",
        EMPTY, LOWEST, LOW, MEDIUM, HIGHEST
    ));
    output.push_str(&format!("Current streak: {} days\n", summary.current_streak));
    output.push_str(&format!("Longest streak: {} days\n", summary.longest_streak));
    output.push_str(&format!(
        "Sessions: {}  Minutes: {}\n",
        summary.total_sessions, summary.total_minutes
    ));
    output
}

/// One status line for the exercise in progress, or `None` outside a workout.
pub fn exercise_line(machine: &WorkoutMachine) -> Option<String> {
    let SessionState::InPhase {
        phase,
        exercise_index,
    } = machine.state()
    else {
        return None;
    };
    let exercise = machine.current_exercise()?;
    let (_, total) = machine.phase_progress(phase);

    let mut line = format!(
        "[{} {}/{}] {} {}",
        phase.label(),
        exercise_index + 1,
        total,
        exercise.name,
        machine.countdown().display()
    );
    if let (Some(sets), Some(reps)) = (exercise.sets, exercise.reps.as_deref()) {
        line.push_str(&format!(" ({} x {})", sets, reps));
    }
    if machine.is_paused() {
        line.push_str(" [paused]");
    }
    Some(line)
}

pub fn completion_line(machine: &WorkoutMachine) -> String {
    format!(
        "Workout complete: {} exercises in {}",
        machine.workout().exercise_count(),
        format_clock(machine.elapsed_seconds())
    )
}
