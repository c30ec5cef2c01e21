use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use gymtrack::db::{Database, MealDeletion};
use gymtrack::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
}

fn start_input(day: &str) -> StartSessionInput {
    StartSessionInput {
        day: day.to_string(),
        warmup_exercises: vec![ExerciseRecord {
            name: "Jumping Jacks".to_string(),
            duration: 60,
            completed: false,
        }],
        strength_exercises: vec![],
        cardio_exercises: vec![],
    }
}

fn completion(total: u32) -> CompleteSessionInput {
    CompleteSessionInput {
        total_duration: total,
        warmup_exercises: vec![ExerciseRecord {
            name: "Jumping Jacks".to_string(),
            duration: 60,
            completed: true,
        }],
        strength_exercises: vec![],
        cardio_exercises: vec![],
    }
}

fn food(name: &str, calories: f64, protein: f64) -> FoodRecord {
    FoodRecord {
        name: name.to_string(),
        quantity: Some("1 bowl".to_string()),
        calories,
        protein,
        carbs: 10.0,
        fat: 2.0,
        fiber: Some(3.0),
        vitamins: Some(vec!["Iron".to_string()]),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "sessions" {
        describe "create_session" {
            it "creates an incomplete session with its exercises" {
                let session = db.create_session_at(start_input("Monday"), at(12, 6))
                    .expect("Failed to create session");

                assert_eq!(session.day, "Monday");
                assert!(!session.completed);
                assert!(session.end_time.is_none());
                assert_eq!(session.total_duration, 0);
                assert_eq!(session.warmup_exercises.len(), 1);
                assert_eq!(session.date, at(12, 6));
            }

            it "round trips through get_session" {
                let created = db.create_session_at(start_input("Monday"), at(12, 6))
                    .expect("Failed to create session");

                let found = db.get_session(created.id).expect("Query failed");
                assert_eq!(found, Some(created));
            }
        }

        describe "complete_session" {
            it "marks the session complete with the reported exercises" {
                let created = db.create_session_at(start_input("Monday"), at(12, 6))
                    .expect("Failed to create session");

                let done = db.complete_session_at(created.id, completion(2400), at(12, 7))
                    .expect("Query failed")
                    .expect("Session should exist");

                assert!(done.completed);
                assert_eq!(done.total_duration, 2400);
                assert_eq!(done.end_time, Some(at(12, 7)));
                assert!(done.warmup_exercises[0].completed);
                // the session keeps the day it was started on
                assert_eq!(done.date, at(12, 6));
            }

            it "returns None for an unknown id" {
                let result = db.complete_session(Uuid::new_v4(), completion(10))
                    .expect("Query failed");
                assert!(result.is_none());
            }
        }

        describe "get_history" {
            it "returns newest first" {
                db.create_session_at(start_input("Monday"), at(12, 6)).unwrap();
                db.create_session_at(start_input("Wednesday"), at(14, 6)).unwrap();
                db.create_session_at(start_input("Tuesday"), at(13, 6)).unwrap();

                let history = db.get_history(30).expect("Query failed");
                let days: Vec<&str> = history.iter().map(|s| s.day.as_str()).collect();
                assert_eq!(days, vec!["Wednesday", "Tuesday", "Monday"]);
            }

            it "never returns more than thirty sessions" {
                for i in 0..35 {
                    let when = at(1, 0) + chrono::Duration::hours(i);
                    db.create_session_at(start_input("Monday"), when).unwrap();
                }

                assert_eq!(db.get_history(100).unwrap().len(), 30);
                assert_eq!(db.get_history(5).unwrap().len(), 5);
            }
        }

        describe "get_completed_since" {
            it "only returns completed sessions inside the window" {
                let old = db.create_session_at(start_input("Monday"), at(1, 6)).unwrap();
                db.complete_session_at(old.id, completion(600), at(1, 7)).unwrap();
                let recent = db.create_session_at(start_input("Friday"), at(16, 6)).unwrap();
                db.complete_session_at(recent.id, completion(1200), at(16, 7)).unwrap();
                db.create_session_at(start_input("Friday"), at(16, 9)).unwrap();

                let sessions = db.get_completed_since(at(10, 0)).expect("Query failed");
                assert_eq!(sessions.len(), 1);
                assert_eq!(sessions[0].id, recent.id);
                assert_eq!(sessions[0].total_duration, 1200);
            }
        }

        describe "get_session_for_day" {
            it "returns None when nothing was started" {
                assert!(db.get_session_for_day(date(16), &utc()).unwrap().is_none());
            }

            it "uses the configured offset for day boundaries" {
                // 20:00 UTC on the 15th is 01:30 on the 16th in UTC+5:30
                let late = db.create_session_at(start_input("Friday"), at(15, 20)).unwrap();

                let found = db.get_session_for_day(date(16), &ist()).unwrap();
                assert_eq!(found.map(|s| s.id), Some(late.id));
                assert!(db.get_session_for_day(date(16), &utc()).unwrap().is_none());
            }
        }

        describe "has_completed_session_on" {
            it "ignores sessions that were never completed" {
                db.create_session_at(start_input("Friday"), at(16, 6)).unwrap();
                assert!(!db.has_completed_session_on(date(16), &utc()).unwrap());
            }

            it "finds a completed session" {
                let session = db.create_session_at(start_input("Friday"), at(16, 6)).unwrap();
                db.complete_session_at(session.id, completion(2400), at(16, 7)).unwrap();
                assert!(db.has_completed_session_on(date(16), &utc()).unwrap());
                assert!(!db.has_completed_session_on(date(15), &utc()).unwrap());
            }
        }
    }

    describe "diet" {
        describe "log_meal" {
            it "creates the day and accumulates totals" {
                let first = db.log_meal(date(16), food("Oats", 300.0, 10.0)).expect("Failed to log");
                assert!(first.success);
                assert_eq!(first.totals.calories, 300.0);

                let second = db.log_meal(date(16), food("Eggs", 150.0, 12.0)).expect("Failed to log");
                assert_eq!(second.totals.calories, 450.0);
                assert_eq!(second.totals.protein, 22.0);
                assert_eq!(second.totals.carbs, 20.0);
                assert_ne!(first.meal_id, second.meal_id);
            }
        }

        describe "get_diet" {
            it "is empty for a day with nothing logged" {
                let diet = db.get_diet(date(16)).expect("Query failed");
                assert!(diet.meals.is_empty());
                assert_eq!(diet.totals, NutritionTotals::default());
            }

            it "returns the day's meals with their details" {
                let logged = db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();
                db.log_meal(date(15), food("Pizza", 800.0, 30.0)).unwrap();

                let diet = db.get_diet(date(16)).expect("Query failed");
                assert_eq!(diet.meals.len(), 1);
                let meal = &diet.meals[0];
                assert_eq!(meal.id, logged.meal_id);
                assert_eq!(meal.quantity.as_deref(), Some("1 bowl"));
                assert_eq!(meal.fiber, 3.0);
                assert_eq!(meal.vitamins, vec!["Iron".to_string()]);
                assert_eq!(diet.totals.calories, 300.0);
            }

            it "stores missing fiber and vitamins as empty" {
                db.log_meal(date(16), FoodRecord {
                    name: "Water".to_string(),
                    ..Default::default()
                }).unwrap();

                let diet = db.get_diet(date(16)).unwrap();
                assert_eq!(diet.meals[0].fiber, 0.0);
                assert!(diet.meals[0].vitamins.is_empty());
            }
        }

        describe "delete_meal" {
            it "subtracts the meal from the totals" {
                db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();
                let eggs = db.log_meal(date(16), food("Eggs", 150.0, 12.0)).unwrap();

                let result = db.delete_meal(date(16), eggs.meal_id).expect("Delete failed");
                match result {
                    MealDeletion::Deleted(totals) => {
                        assert_eq!(totals.calories, 300.0);
                        assert_eq!(totals.protein, 10.0);
                    }
                    other => panic!("unexpected {:?}", other),
                }

                let diet = db.get_diet(date(16)).unwrap();
                assert_eq!(diet.meals.len(), 1);
                assert_eq!(diet.totals.calories, 300.0);
            }

            it "rejects a second delete and leaves totals alone" {
                let oats = db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();
                db.log_meal(date(16), food("Eggs", 150.0, 12.0)).unwrap();

                assert!(matches!(db.delete_meal(date(16), oats.meal_id).unwrap(), MealDeletion::Deleted(_)));
                assert_eq!(db.delete_meal(date(16), oats.meal_id).unwrap(), MealDeletion::NotFound);
                assert_eq!(db.get_diet(date(16)).unwrap().totals.calories, 150.0);
            }

            it "reports a day with no log" {
                assert_eq!(db.delete_meal(date(16), Uuid::new_v4()).unwrap(), MealDeletion::NoDiet);
            }

            it "does not delete a meal logged on another day" {
                let yesterday = db.log_meal(date(15), food("Pizza", 800.0, 30.0)).unwrap();
                db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();

                assert_eq!(db.delete_meal(date(16), yesterday.meal_id).unwrap(), MealDeletion::NotFound);
                assert_eq!(db.get_diet(date(15)).unwrap().meals.len(), 1);
            }
        }

        describe "cleanup_before" {
            it "removes earlier days and their meals" {
                db.log_meal(date(14), food("Pizza", 800.0, 30.0)).unwrap();
                db.log_meal(date(15), food("Pasta", 600.0, 20.0)).unwrap();
                db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();

                let removed = db.cleanup_before(date(16)).expect("Cleanup failed");
                assert_eq!(removed, 2);
                assert!(db.get_diet(date(15)).unwrap().meals.is_empty());
                assert_eq!(db.get_diet(date(16)).unwrap().meals.len(), 1);
            }

            it "is a no-op when nothing is older" {
                db.log_meal(date(16), food("Oats", 300.0, 10.0)).unwrap();
                assert_eq!(db.cleanup_before(date(16)).unwrap(), 0);
            }
        }
    }
}
