mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

/// Upper bound on history queries.
pub const HISTORY_LIMIT: usize = 30;

/// Result of deleting a meal from a day's log.
#[derive(Debug, Clone, PartialEq)]
pub enum MealDeletion {
    /// Removed; carries the recomputed totals.
    Deleted(NutritionTotals),
    /// Nothing was logged on that day.
    NoDiet,
    /// The day exists but the meal does not (or was already deleted).
    NotFound,
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "gymtrack")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("gymtrack.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Session operations
    // ============================================================

    pub fn create_session(&self, input: StartSessionInput) -> Result<WorkoutSession> {
        self.create_session_at(input, Utc::now())
    }

    pub fn create_session_at(
        &self,
        input: StartSessionInput,
        now: DateTime<Utc>,
    ) -> Result<WorkoutSession> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO sessions (id, date, day, start_time, completed, warmup_exercises, strength_exercises, cardio_exercises, total_duration)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?, 0)",
            (
                id.to_string(),
                format_ts(now),
                &input.day,
                format_ts(now),
                serde_json::to_string(&input.warmup_exercises)?,
                serde_json::to_string(&input.strength_exercises)?,
                serde_json::to_string(&input.cardio_exercises)?,
            ),
        )?;

        Ok(WorkoutSession {
            id,
            date: now,
            day: input.day,
            start_time: now,
            end_time: None,
            completed: false,
            warmup_exercises: input.warmup_exercises,
            strength_exercises: input.strength_exercises,
            cardio_exercises: input.cardio_exercises,
            total_duration: 0,
        })
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<WorkoutSession>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let session = conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS),
                [id.to_string()],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Mark a session finished. Returns `None` when the id is unknown.
    pub fn complete_session(
        &self,
        id: Uuid,
        input: CompleteSessionInput,
    ) -> Result<Option<WorkoutSession>> {
        self.complete_session_at(id, input, Utc::now())
    }

    pub fn complete_session_at(
        &self,
        id: Uuid,
        input: CompleteSessionInput,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkoutSession>> {
        {
            let conn = self.conn.lock().expect("database lock poisoned");
            let rows = conn.execute(
                "UPDATE sessions
                 SET completed = 1, end_time = ?, total_duration = ?,
                     warmup_exercises = ?, strength_exercises = ?, cardio_exercises = ?
                 WHERE id = ?",
                (
                    format_ts(now),
                    input.total_duration,
                    serde_json::to_string(&input.warmup_exercises)?,
                    serde_json::to_string(&input.strength_exercises)?,
                    serde_json::to_string(&input.cardio_exercises)?,
                    id.to_string(),
                ),
            )?;
            if rows == 0 {
                return Ok(None);
            }
        }

        self.get_session(id)
    }

    /// Most recent sessions first, at most [`HISTORY_LIMIT`].
    pub fn get_history(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, date, day, completed, total_duration
             FROM sessions ORDER BY date DESC, rowid DESC LIMIT ?",
        )?;

        let sessions = stmt
            .query_map([limit.min(HISTORY_LIMIT) as i64], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Completed sessions dated on or after `since`, newest first.
    pub fn get_completed_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionSummary>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, date, day, completed, total_duration
             FROM sessions WHERE completed = 1 AND date >= ? ORDER BY date DESC",
        )?;

        let sessions = stmt
            .query_map([format_ts(since)], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// The first session started on the given local calendar day.
    pub fn get_session_for_day(
        &self,
        day: NaiveDate,
        offset: &FixedOffset,
    ) -> Result<Option<WorkoutSession>> {
        let (start, end) = day_bounds(day, offset)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let session = conn
            .query_row(
                &format!(
                    "SELECT {} FROM sessions WHERE date >= ? AND date < ? ORDER BY date, rowid LIMIT 1",
                    SESSION_COLUMNS
                ),
                [format_ts(start), format_ts(end)],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    pub fn has_completed_session_on(&self, day: NaiveDate, offset: &FixedOffset) -> Result<bool> {
        let (start, end) = day_bounds(day, offset)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE completed = 1 AND date >= ? AND date < ?",
            [format_ts(start), format_ts(end)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ============================================================
    // Diet operations
    // ============================================================

    /// Add a meal to the day's log, creating the day on first use.
    pub fn log_meal(&self, day: NaiveDate, food: FoodRecord) -> Result<MealLogged> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let day_key = day_key(day);

        tx.execute(
            "INSERT OR IGNORE INTO diets (date, created_at) VALUES (?, ?)",
            (&day_key, format_ts(now)),
        )?;

        tx.execute(
            "INSERT INTO meals (id, diet_date, name, quantity, calories, protein, carbs, fat, fiber, vitamins, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &day_key,
                &food.name,
                &food.quantity,
                food.calories,
                food.protein,
                food.carbs,
                food.fat,
                food.fiber.unwrap_or(0.0),
                serde_json::to_string(&food.vitamins.clone().unwrap_or_default())?,
                format_ts(now),
            ),
        )?;

        let totals = read_totals(&tx, &day_key)?.unwrap_or_default().add(&food);
        write_totals(&tx, &day_key, &totals)?;
        tx.commit()?;

        Ok(MealLogged {
            success: true,
            meal_id: id,
            totals,
        })
    }

    pub fn get_diet(&self, day: NaiveDate) -> Result<DailyDiet> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let day_key = day_key(day);

        let Some(totals) = read_totals(&conn, &day_key)? else {
            return Ok(DailyDiet::default());
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meals WHERE diet_date = ? ORDER BY timestamp, rowid",
            MEAL_COLUMNS
        ))?;
        let meals = stmt
            .query_map([&day_key], meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DailyDiet { meals, totals })
    }

    /// Remove a meal and subtract it from the day's totals.
    ///
    /// Deleting the same id twice yields [`MealDeletion::NotFound`] the second
    /// time and leaves the totals alone.
    pub fn delete_meal(&self, day: NaiveDate, meal_id: Uuid) -> Result<MealDeletion> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let day_key = day_key(day);

        let Some(totals) = read_totals(&tx, &day_key)? else {
            return Ok(MealDeletion::NoDiet);
        };

        let meal = tx
            .query_row(
                &format!(
                    "SELECT {} FROM meals WHERE id = ? AND diet_date = ?",
                    MEAL_COLUMNS
                ),
                (meal_id.to_string(), &day_key),
                meal_from_row,
            )
            .optional()?;
        let Some(meal) = meal else {
            return Ok(MealDeletion::NotFound);
        };

        tx.execute("DELETE FROM meals WHERE id = ?", [meal_id.to_string()])?;
        let totals = totals.subtract(&meal);
        write_totals(&tx, &day_key, &totals)?;
        tx.commit()?;

        Ok(MealDeletion::Deleted(totals))
    }

    /// Drop every diet day before `day`. Meals go with their day.
    pub fn cleanup_before(&self, day: NaiveDate) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let removed = conn.execute("DELETE FROM diets WHERE date < ?", [day_key(day)])?;
        Ok(removed)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

const SESSION_COLUMNS: &str = "id, date, day, start_time, end_time, completed, warmup_exercises, strength_exercises, cardio_exercises, total_duration";

const MEAL_COLUMNS: &str =
    "id, name, quantity, calories, protein, carbs, fat, fiber, vitamins, timestamp";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutSession> {
    Ok(WorkoutSession {
        id: parse_uuid(row.get::<_, String>(0)?),
        date: parse_datetime(row.get::<_, String>(1)?),
        day: row.get(2)?,
        start_time: parse_datetime(row.get::<_, String>(3)?),
        end_time: row.get::<_, Option<String>>(4)?.map(parse_datetime),
        completed: row.get::<_, i32>(5)? != 0,
        warmup_exercises: parse_json_list(row.get::<_, String>(6)?),
        strength_exercises: parse_json_list(row.get::<_, String>(7)?),
        cardio_exercises: parse_json_list(row.get::<_, String>(8)?),
        total_duration: row.get(9)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SessionSummary> {
    Ok(SessionSummary {
        id: parse_uuid(row.get::<_, String>(0)?),
        date: parse_datetime(row.get::<_, String>(1)?),
        day: row.get(2)?,
        completed: row.get::<_, i32>(3)? != 0,
        total_duration: row.get(4)?,
    })
}

fn meal_from_row(row: &Row<'_>) -> rusqlite::Result<Meal> {
    Ok(Meal {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        quantity: row.get(2)?,
        calories: row.get(3)?,
        protein: row.get(4)?,
        carbs: row.get(5)?,
        fat: row.get(6)?,
        fiber: row.get(7)?,
        vitamins: parse_json_list(row.get::<_, String>(8)?),
        timestamp: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn read_totals(conn: &Connection, day_key: &str) -> Result<Option<NutritionTotals>> {
    let totals = conn
        .query_row(
            "SELECT total_calories, total_protein, total_carbs, total_fat FROM diets WHERE date = ?",
            [day_key],
            |row| {
                Ok(NutritionTotals {
                    calories: row.get(0)?,
                    protein: row.get(1)?,
                    carbs: row.get(2)?,
                    fat: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(totals)
}

fn write_totals(conn: &Connection, day_key: &str, totals: &NutritionTotals) -> Result<()> {
    conn.execute(
        "UPDATE diets SET total_calories = ?, total_protein = ?, total_carbs = ?, total_fat = ? WHERE date = ?",
        (
            totals.calories,
            totals.protein,
            totals.carbs,
            totals.fat,
            day_key,
        ),
    )?;
    Ok(())
}

/// UTC bounds `[start, end)` of a local calendar day.
fn day_bounds(day: NaiveDate, offset: &FixedOffset) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = day
        .checked_add_days(Days::new(1))
        .ok_or_else(|| anyhow::anyhow!("Date out of range: {}", day))?;
    let start = offset
        .from_local_datetime(&day.and_time(chrono::NaiveTime::MIN))
        .single()
        .ok_or_else(|| anyhow::anyhow!("Ambiguous local date: {}", day))?;
    let end = offset
        .from_local_datetime(&next.and_time(chrono::NaiveTime::MIN))
        .single()
        .ok_or_else(|| anyhow::anyhow!("Ambiguous local date: {}", next))?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Fixed-width timestamps so that string comparison in SQL orders correctly.
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_json_list<T: serde::de::DeserializeOwned>(s: String) -> Vec<T> {
    serde_json::from_str(&s).unwrap_or_default()
}
