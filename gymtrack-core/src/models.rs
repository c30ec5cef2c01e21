//! Records exchanged between the server, its storage and its clients.
//!
//! Field names follow the JSON shapes the web client already speaks: camelCase
//! throughout and `_id` for identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::{DayWorkout, Exercise};
use crate::stats::ActivitySummary;

// ============================================================
// Workout sessions
// ============================================================

/// An exercise as stored on a session, tagged with its completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub name: String,
    pub duration: u32,
    #[serde(default)]
    pub completed: bool,
}

impl ExerciseRecord {
    pub fn from_exercise(exercise: &Exercise, completed: bool) -> Self {
        Self {
            name: exercise.name.clone(),
            duration: exercise.duration,
            completed,
        }
    }
}

/// One attempt at a day's workout.
///
/// Created when the workout starts and updated once, on completion. Abandoned
/// sessions stay with `completed == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub day: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub warmup_exercises: Vec<ExerciseRecord>,
    pub strength_exercises: Vec<ExerciseRecord>,
    pub cardio_exercises: Vec<ExerciseRecord>,
    /// Seconds spent, as measured by the client.
    pub total_duration: u32,
}

/// The history view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub day: String,
    pub completed: bool,
    pub total_duration: u32,
}

impl From<WorkoutSession> for SessionSummary {
    fn from(s: WorkoutSession) -> Self {
        Self {
            id: s.id,
            date: s.date,
            day: s.day,
            completed: s.completed,
            total_duration: s.total_duration,
        }
    }
}

/// Request body for starting a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionInput {
    pub day: String,
    #[serde(default)]
    pub warmup_exercises: Vec<ExerciseRecord>,
    #[serde(default)]
    pub strength_exercises: Vec<ExerciseRecord>,
    #[serde(default)]
    pub cardio_exercises: Vec<ExerciseRecord>,
}

/// Request body for completing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionInput {
    pub total_duration: u32,
    #[serde(default)]
    pub warmup_exercises: Vec<ExerciseRecord>,
    #[serde(default)]
    pub strength_exercises: Vec<ExerciseRecord>,
    #[serde(default)]
    pub cardio_exercises: Vec<ExerciseRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: WorkoutSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodaySessionResponse {
    pub success: bool,
    pub session: Option<WorkoutSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    pub rest_day: bool,
    pub workout: DayWorkout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: ActivitySummary,
}

// ============================================================
// Diet
// ============================================================

/// A food record as logged by the user or proposed by the image analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitamins: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub vitamins: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Running macro totals for a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutritionTotals {
    pub fn add(&self, food: &FoodRecord) -> Self {
        Self {
            calories: self.calories + food.calories,
            protein: self.protein + food.protein,
            carbs: self.carbs + food.carbs,
            fat: self.fat + food.fat,
        }
    }

    pub fn subtract(&self, meal: &Meal) -> Self {
        Self {
            calories: self.calories - meal.calories,
            protein: self.protein - meal.protein,
            carbs: self.carbs - meal.carbs,
            fat: self.fat - meal.fat,
        }
    }
}

/// Everything logged on one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyDiet {
    pub meals: Vec<Meal>,
    pub totals: NutritionTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogged {
    pub success: bool,
    pub meal_id: Uuid,
    pub totals: NutritionTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietDay {
    pub success: bool,
    pub meals: Vec<Meal>,
    pub totals: NutritionTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodAnalysis {
    pub success: bool,
    pub food: FoodRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub removed: usize,
}

// ============================================================
// Misc
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Result of a reminder check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOutcome {
    pub sent: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serializes_with_wire_field_names() {
        let now = Utc::now();
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            date: now,
            day: "Monday".to_string(),
            start_time: now,
            end_time: None,
            completed: false,
            warmup_exercises: vec![],
            strength_exercises: vec![],
            cardio_exercises: vec![],
            total_duration: 0,
        };

        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("startTime").is_some());
        assert!(json.get("warmupExercises").is_some());
        assert!(json.get("totalDuration").is_some());
    }

    #[test]
    fn food_record_defaults_missing_macros_to_zero() {
        let food: FoodRecord = serde_json::from_str(r#"{"name": "Apple"}"#).unwrap();
        assert_eq!(food.calories, 0.0);
        assert!(food.fiber.is_none());
    }

    #[test]
    fn totals_add_then_subtract_back_to_start() {
        let food = FoodRecord {
            name: "Rice".to_string(),
            calories: 200.0,
            protein: 4.0,
            carbs: 44.0,
            fat: 0.5,
            ..Default::default()
        };
        let meal = Meal {
            id: Uuid::new_v4(),
            name: food.name.clone(),
            quantity: None,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            fiber: 0.0,
            vitamins: vec![],
            timestamp: Utc::now(),
        };

        let totals = NutritionTotals::default().add(&food);
        assert_eq!(totals.calories, 200.0);
        assert_eq!(totals.subtract(&meal), NutritionTotals::default());
    }
}
