//! The fixed weekly workout plan.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The weekday that carries no workout. Streaks treat it as transparent.
pub const DEFAULT_REST_DAY: Weekday = Weekday::Sun;

/// A single timed exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    /// Countdown length in seconds.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    /// Free text such as "15 reps" or "60 sec hold".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    pub instructions: String,
}

impl Exercise {
    pub fn timed(name: &str, duration: u32, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            duration,
            sets: None,
            reps: None,
            instructions: instructions.to_string(),
        }
    }

    pub fn with_sets(name: &str, duration: u32, sets: u32, reps: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            duration,
            sets: Some(sets),
            reps: Some(reps.to_string()),
            instructions: instructions.to_string(),
        }
    }
}

/// An ordered stage of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    Strength,
    Cardio,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Warmup, Phase::Strength, Phase::Cardio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Strength => "strength",
            Self::Cardio => "cardio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "warmup" => Some(Self::Warmup),
            "strength" => Some(Self::Strength),
            "cardio" => Some(Self::Cardio),
            _ => None,
        }
    }

    /// The phase that follows this one, or `None` after cardio.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Warmup => Some(Self::Strength),
            Self::Strength => Some(Self::Cardio),
            Self::Cardio => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Warmup => "Warm-up",
            Self::Strength => "Strength",
            Self::Cardio => "Cardio",
        }
    }
}

/// Nominal phase lengths of a training day, in seconds.
pub const WARMUP_SECONDS: u32 = 5 * 60;
pub const STRENGTH_SECONDS: u32 = 25 * 60;
pub const CARDIO_SECONDS: u32 = 10 * 60;
pub const TOTAL_WORKOUT_SECONDS: u32 = WARMUP_SECONDS + STRENGTH_SECONDS + CARDIO_SECONDS;

/// One weekday of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkout {
    /// Full weekday name, e.g. "Monday".
    pub day: String,
    pub title: String,
    pub description: String,
    pub warmup: Vec<Exercise>,
    pub strength: Vec<Exercise>,
    pub cardio: Vec<Exercise>,
}

impl DayWorkout {
    pub fn exercises(&self, phase: Phase) -> &[Exercise] {
        match phase {
            Phase::Warmup => &self.warmup,
            Phase::Strength => &self.strength,
            Phase::Cardio => &self.cardio,
        }
    }

    /// A day with neither strength nor cardio work is a rest day.
    pub fn is_rest_day(&self) -> bool {
        self.strength.is_empty() && self.cardio.is_empty()
    }

    pub fn exercise_count(&self) -> usize {
        self.warmup.len() + self.strength.len() + self.cardio.len()
    }

    pub fn total_seconds(&self) -> u32 {
        Phase::ALL
            .iter()
            .flat_map(|p| self.exercises(*p))
            .map(|e| e.duration)
            .sum()
    }
}

/// Seven days of workouts, indexed from Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    days: Vec<DayWorkout>,
}

impl WeeklySchedule {
    /// Build a schedule from seven days ordered Sunday..Saturday.
    pub fn new(days: Vec<DayWorkout>) -> Option<Self> {
        if days.len() != 7 {
            return None;
        }
        Some(Self { days })
    }

    pub fn for_weekday(&self, weekday: Weekday) -> &DayWorkout {
        &self.days[weekday.num_days_from_sunday() as usize]
    }

    pub fn for_date(&self, date: NaiveDate) -> &DayWorkout {
        self.for_weekday(date.weekday())
    }

    pub fn days(&self) -> &[DayWorkout] {
        &self.days
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            days: vec![
                sunday(),
                monday(),
                tuesday(),
                wednesday(),
                thursday(),
                friday(),
                saturday(),
            ],
        }
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn warmup() -> Vec<Exercise> {
    vec![
        Exercise::timed(
            "Jumping Jacks",
            60,
            "Jump while spreading arms and legs, then return to standing position",
        ),
        Exercise::timed(
            "Arm Circles (Forward + Backward)",
            60,
            "Extend arms and rotate in circles, 30 seconds each direction",
        ),
        Exercise::timed("Hip Circles", 60, "Place hands on hips and rotate in large circles"),
        Exercise::timed(
            "Bodyweight Squats",
            60,
            "Stand feet shoulder-width apart, squat down keeping back straight",
        ),
        Exercise::timed(
            "Toe Touch + Shoulder Stretch",
            60,
            "Bend forward to touch toes, then stretch shoulders",
        ),
    ]
}

fn training_day(
    weekday: Weekday,
    title: &str,
    description: &str,
    strength: Vec<Exercise>,
    cardio: Exercise,
) -> DayWorkout {
    DayWorkout {
        day: weekday_name(weekday).to_string(),
        title: title.to_string(),
        description: description.to_string(),
        warmup: warmup(),
        strength,
        cardio: vec![cardio],
    }
}

fn sunday() -> DayWorkout {
    DayWorkout {
        day: weekday_name(Weekday::Sun).to_string(),
        title: "REST DAY".to_string(),
        description: "Recovery is part of the process. Rest, hydrate, sleep well.".to_string(),
        warmup: Vec::new(),
        strength: Vec::new(),
        cardio: Vec::new(),
    }
}

fn monday() -> DayWorkout {
    training_day(
        Weekday::Mon,
        "UPPER PUSH",
        "Chest, Shoulders, Triceps + Cardio",
        vec![
            Exercise::with_sets("Push-ups", 300, 4, "15 reps", "Keep body straight, lower chest to ground, push back up"),
            Exercise::with_sets("Pike Push-ups", 300, 3, "12 reps", "Form inverted V shape, lower head toward ground"),
            Exercise::with_sets("Chair/Bed Triceps Dips", 300, 4, "12 reps", "Hands on edge, lower body by bending elbows, push back up"),
            Exercise::with_sets("Incline Push-ups (Slow)", 300, 3, "15 reps", "Hands elevated on surface, perform slow controlled push-ups"),
            Exercise::with_sets("Wide Push-ups", 300, 3, "12 reps", "Hands wider than shoulders, focus on chest activation"),
        ],
        Exercise::timed("Mountain Climbers", 600, "Plank position, alternate driving knees to chest at steady pace"),
    )
}

fn tuesday() -> DayWorkout {
    training_day(
        Weekday::Tue,
        "LOWER BODY",
        "Legs + Thigh Fat Focus + Cardio",
        vec![
            Exercise::with_sets("Squats", 300, 4, "15 reps", "Feet shoulder-width, lower until thighs parallel to ground"),
            Exercise::with_sets("Forward Lunges", 300, 3, "12 each leg", "Step forward, lower back knee toward ground, alternate legs"),
            Exercise::with_sets("Wall Sit", 300, 3, "60 sec hold", "Back against wall, slide down until knees at 90 degrees, hold"),
            Exercise::with_sets("Squat Pulses", 300, 3, "20 reps", "Hold squat position, pulse up and down in small movements"),
            Exercise::with_sets("Glute Bridges", 300, 4, "15 reps", "Lie on back, push hips up squeezing glutes, lower slowly"),
        ],
        Exercise::timed("High Knees", 600, "Run in place lifting knees high, controlled pace"),
    )
}

fn wednesday() -> DayWorkout {
    training_day(
        Weekday::Wed,
        "PULL + CORE",
        "Back, Biceps, Abs + Cardio",
        vec![
            Exercise::with_sets("Superman Hold", 300, 4, "30 sec hold", "Lie face down, lift arms and legs off ground, hold"),
            Exercise::with_sets("Towel Rows", 300, 4, "12 reps", "Anchor towel to door/bed, pull toward chest, squeeze back"),
            Exercise::with_sets("Plank", 300, 3, "45 sec hold", "Forearms on ground, body straight line, hold position"),
            Exercise::with_sets("Leg Raises", 300, 3, "15 reps", "Lie on back, raise legs to 90 degrees, lower slowly"),
            Exercise::with_sets("Bicycle Crunches", 300, 3, "20 each side", "Alternate elbow to opposite knee, twist core"),
        ],
        Exercise::timed("Invisible Jump Rope", 600, "Mimic jump rope motion without rope, stay on toes"),
    )
}

fn thursday() -> DayWorkout {
    training_day(
        Weekday::Thu,
        "FULL BODY CONDITIONING",
        "Fat-Loss Heavy Day - You'll hate it. Good.",
        vec![
            Exercise::with_sets("Burpees", 375, 5, "10 reps", "Squat, jump back to plank, push-up, jump up, repeat"),
            Exercise::with_sets("Squat to Punch", 375, 4, "15 reps", "Squat down, stand up with alternating punches"),
            Exercise::with_sets("Plank Shoulder Taps", 375, 3, "20 each side", "Plank position, alternate tapping opposite shoulder"),
            Exercise::with_sets("Mountain Climbers", 375, 3, "30 each leg", "Plank position, alternate driving knees to chest fast"),
        ],
        Exercise::timed("Jumping Jacks (Non-stop)", 600, "Continuous jumping jacks, maintain steady pace"),
    )
}

fn friday() -> DayWorkout {
    training_day(
        Weekday::Fri,
        "SHOULDERS + ARMS",
        "Definition Day + Cardio",
        vec![
            Exercise::with_sets("Arm Circles (Slow & Controlled)", 300, 3, "60 sec forward + backward", "Slow, controlled arm circles, feel the burn"),
            Exercise::with_sets("Diamond Push-ups", 300, 4, "10 reps", "Hands form diamond shape under chest, perform push-ups"),
            Exercise::with_sets("Isometric Biceps Hold", 300, 4, "30 sec hold", "Towel curl position, squeeze and hold at 90 degrees"),
            Exercise::with_sets("Triceps Dips", 300, 4, "12 reps", "Use chair or bed edge, dip down and push up"),
            Exercise::with_sets("Pike Push-ups", 300, 3, "10 reps", "Inverted V position, lower head toward ground for shoulders"),
        ],
        Exercise::timed("Mountain Climbers", 600, "Plank position, alternate driving knees to chest"),
    )
}

fn saturday() -> DayWorkout {
    training_day(
        Weekday::Sat,
        "CORE + MOBILITY",
        "Recovery Day - Light Cardio",
        vec![
            Exercise::with_sets("Plank", 300, 3, "60 sec hold", "Hold plank position, focus on breathing"),
            Exercise::with_sets("Bicycle Crunch", 300, 3, "20 each side", "Alternate elbow to opposite knee, twist core"),
            Exercise::with_sets("Cobra Stretch", 300, 3, "45 sec hold", "Lie face down, push upper body up, stretch abs"),
            Exercise::with_sets("Child's Pose", 300, 3, "45 sec hold", "Kneel, sit back on heels, arms extended forward"),
            Exercise::with_sets("Cat-Cow Stretch", 300, 3, "10 cycles", "On all fours, arch and round back alternately"),
        ],
        Exercise::timed("Brisk Walk in Place", 600, "Walk briskly in place, swing arms naturally"),
    )
}
