use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use gymtrack::api::{create_router, AppState};
use gymtrack::config::AppConfig;
use gymtrack::db::Database;
use gymtrack::models::*;
use gymtrack::nutrition::{AnalysisError, DisabledAnalyzer, FoodAnalyzer};
use gymtrack::reminder::{Notifier, NotifyError, ReminderMessage};
use serde_json::{json, Value};

struct StubAnalyzer;

#[async_trait]
impl FoodAnalyzer for StubAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<FoodRecord, AnalysisError> {
        Ok(FoodRecord {
            name: format!("Plate of {} bytes", image.len()),
            calories: 420.0,
            ..Default::default()
        })
    }
}

struct FailingAnalyzer;

#[async_trait]
impl FoodAnalyzer for FailingAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> Result<FoodRecord, AnalysisError> {
        Err(AnalysisError::NoJson)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<ReminderMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, reminder: &ReminderMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(reminder.clone());
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        password: Some("hunter2".to_string()),
        auth_rate_limit: 3,
        ..AppConfig::default()
    }
}

fn setup_with(config: AppConfig, analyzer: Arc<dyn FoodAnalyzer>) -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let state = AppState::with_services(db, config, analyzer, Arc::new(RecordingNotifier::default()));
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

fn setup() -> TestServer {
    setup_with(test_config(), Arc::new(StubAnalyzer))
}

fn start_body() -> Value {
    json!({
        "day": "Monday",
        "warmupExercises": [{ "name": "Jumping Jacks", "duration": 60, "completed": false }],
        "strengthExercises": [{ "name": "Squats", "duration": 120, "completed": false }],
        "cardioExercises": []
    })
}

fn complete_body(total: u32) -> Value {
    json!({
        "totalDuration": total,
        "warmupExercises": [{ "name": "Jumping Jacks", "duration": 60, "completed": true }],
        "strengthExercises": [{ "name": "Squats", "duration": 120, "completed": true }],
        "cardioExercises": []
    })
}

async fn start_session(server: &TestServer) -> WorkoutSession {
    server
        .post("/api/workout/start")
        .json(&start_body())
        .await
        .json::<SessionResponse>()
        .session
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn accepts_the_configured_password() {
        let server = setup();
        let response = server
            .post("/api/auth/verify")
            .json(&json!({ "password": "hunter2" }))
            .await;

        response.assert_status_ok();
        let body: MessageResponse = response.json();
        assert!(body.success);
        assert_eq!(body.message, "Access granted");
    }

    #[tokio::test]
    async fn rejects_a_wrong_password() {
        let server = setup();
        let response = server
            .post("/api/auth/verify")
            .json(&json!({ "password": "nope" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Incorrect password");
    }

    #[tokio::test]
    async fn rejects_everything_without_a_configured_password() {
        let config = AppConfig {
            password: None,
            ..test_config()
        };
        let server = setup_with(config, Arc::new(StubAnalyzer));
        let response = server
            .post("/api/auth/verify")
            .json(&json!({ "password": "" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn throttles_repeated_attempts() {
        let server = setup();
        for _ in 0..3 {
            server
                .post("/api/auth/verify")
                .json(&json!({ "password": "guess" }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let response = server
            .post("/api/auth/verify")
            .json(&json!({ "password": "hunter2" }))
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn forged_forwarded_for_does_not_escape_the_limit() {
        let server = setup();
        for n in 1..=3 {
            server
                .post("/api/auth/verify")
                .add_header("X-Forwarded-For", format!("203.0.113.{}", n))
                .json(&json!({ "password": "guess" }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let response = server
            .post("/api/auth/verify")
            .add_header("X-Forwarded-For", "203.0.113.99")
            .json(&json!({ "password": "hunter2" }))
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}

mod workout {
    use super::*;

    #[tokio::test]
    async fn start_creates_an_open_session() {
        let server = setup();
        let response = server.post("/api/workout/start").json(&start_body()).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["session"]["day"], "Monday");
        assert_eq!(body["session"]["completed"], false);
        assert!(body["session"]["_id"].is_string());
        assert_eq!(body["session"]["warmupExercises"][0]["name"], "Jumping Jacks");
    }

    #[tokio::test]
    async fn start_requires_a_day() {
        let server = setup();
        let response = server
            .post("/api/workout/start")
            .json(&json!({ "day": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn complete_records_duration_and_flags() {
        let server = setup();
        let session = start_session(&server).await;

        let response = server
            .put(&format!("/api/workout/{}/complete", session.id))
            .json(&complete_body(2400))
            .await;

        response.assert_status_ok();
        let body: SessionResponse = response.json();
        assert!(body.session.completed);
        assert_eq!(body.session.total_duration, 2400);
        assert!(body.session.end_time.is_some());
        assert!(body.session.strength_exercises[0].completed);
    }

    #[tokio::test]
    async fn complete_unknown_session_is_not_found() {
        let server = setup();
        let response = server
            .put(&format!("/api/workout/{}/complete", uuid::Uuid::new_v4()))
            .json(&complete_body(10))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "Session not found");
    }

    #[tokio::test]
    async fn history_lists_summaries_newest_first() {
        let server = setup();
        let first = start_session(&server).await;
        let second = start_session(&server).await;

        let response = server.get("/api/workout/history").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0]["_id"], second.id.to_string());
        assert_eq!(sessions[1]["_id"], first.id.to_string());
        assert!(sessions[0].get("totalDuration").is_some());
        assert!(sessions[0].get("warmupExercises").is_none());
    }

    #[tokio::test]
    async fn today_is_null_until_a_session_starts() {
        let server = setup();

        let body: Value = server.get("/api/workout/today").await.json();
        assert!(body["session"].is_null());

        let session = start_session(&server).await;
        let body: Value = server.get("/api/workout/today").await.json();
        assert_eq!(body["session"]["_id"], session.id.to_string());
    }

    #[tokio::test]
    async fn schedule_flags_rest_day_consistently() {
        let server = setup();
        let response = server.get("/api/workout/schedule").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let workout = &body["workout"];
        let empty = workout["strength"].as_array().unwrap().is_empty()
            && workout["cardio"].as_array().unwrap().is_empty();
        assert_eq!(body["restDay"], empty);
    }

    #[tokio::test]
    async fn stats_count_completed_sessions() {
        let server = setup();
        let done = start_session(&server).await;
        server
            .put(&format!("/api/workout/{}/complete", done.id))
            .json(&complete_body(2400))
            .await
            .assert_status_ok();
        // abandoned sessions do not count
        start_session(&server).await;

        let response = server.get("/api/workout/stats").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let stats = &body["stats"];
        assert_eq!(stats["totalSessions"], 1);
        assert_eq!(stats["totalMinutes"], 40);
        assert_eq!(stats["heatmap"].as_array().unwrap().len(), 84);
        let last = &stats["heatmap"][83];
        assert_eq!(last["isToday"], true);
        assert_eq!(last["minutes"], 40);
        assert_eq!(last["tier"], "highest");
    }
}

mod diet {
    use super::*;

    fn meal(name: &str, calories: f64) -> Value {
        json!({ "name": name, "calories": calories, "protein": 10, "carbs": 20, "fat": 5 })
    }

    #[tokio::test]
    async fn log_returns_id_and_running_totals() {
        let server = setup();
        server.post("/api/diet/log").json(&meal("Oats", 300.0)).await.assert_status_ok();

        let response = server.post("/api/diet/log").json(&meal("Eggs", 150.0)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["mealId"].is_string());
        assert_eq!(body["totals"]["calories"], 450.0);
        assert_eq!(body["totals"]["protein"], 20.0);
    }

    #[tokio::test]
    async fn log_requires_a_name() {
        let server = setup();
        let response = server.post("/api/diet/log").json(&meal(" ", 100.0)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn today_lists_logged_meals() {
        let server = setup();
        let empty: DietDay = server.get("/api/diet/today").await.json();
        assert!(empty.meals.is_empty());
        assert_eq!(empty.totals.calories, 0.0);

        server.post("/api/diet/log").json(&meal("Oats", 300.0)).await;

        let body: Value = server.get("/api/diet/today").await.json();
        assert_eq!(body["meals"][0]["name"], "Oats");
        assert!(body["meals"][0]["_id"].is_string());
        assert_eq!(body["totals"]["calories"], 300.0);
    }

    #[tokio::test]
    async fn delete_twice_is_rejected_the_second_time() {
        let server = setup();
        server.post("/api/diet/log").json(&meal("Oats", 300.0)).await;
        let logged: MealLogged = server.post("/api/diet/log").json(&meal("Eggs", 150.0)).await.json();

        let path = format!("/api/diet/meal/{}", logged.meal_id);
        server.delete(&path).await.assert_status_ok();
        let second = server.delete(&path).await;
        second.assert_status(StatusCode::NOT_FOUND);

        let body: DietDay = server.get("/api/diet/today").await.json();
        assert_eq!(body.meals.len(), 1);
        assert_eq!(body.totals.calories, 300.0);
    }

    #[tokio::test]
    async fn delete_without_a_log_is_not_found() {
        let server = setup();
        let response = server
            .delete(&format!("/api/diet/meal/{}", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "No diet record found");
    }

    #[tokio::test]
    async fn cleanup_keeps_today() {
        let server = setup();
        server.post("/api/diet/log").json(&meal("Oats", 300.0)).await;

        let response = server.delete("/api/diet/cleanup").await;

        response.assert_status_ok();
        let body: CleanupResponse = response.json();
        assert_eq!(body.removed, 0);
        let today: DietDay = server.get("/api/diet/today").await.json();
        assert_eq!(today.meals.len(), 1);
    }
}

mod analyze {
    use super::*;

    #[tokio::test]
    async fn returns_the_estimate() {
        let server = setup();
        let response = server
            .post("/api/diet/analyze")
            .json(&json!({ "image": "YWJj" }))
            .await;

        response.assert_status_ok();
        let body: FoodAnalysis = response.json();
        assert!(body.success);
        assert_eq!(body.food.name, "Plate of 3 bytes");
        assert_eq!(body.food.calories, 420.0);
    }

    #[tokio::test]
    async fn requires_an_image() {
        let server = setup();
        let response = server.post("/api/diet/analyze").json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "No image provided");
    }

    #[tokio::test]
    async fn rejects_invalid_base64() {
        let server = setup();
        let response = server
            .post("/api/diet/analyze")
            .json(&json!({ "image": "%%%" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyzer_failure_is_a_bad_gateway() {
        let server = setup_with(test_config(), Arc::new(FailingAnalyzer));
        let response = server
            .post("/api/diet/analyze")
            .json(&json!({ "image": "YWJj" }))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn disabled_analyzer_is_unavailable() {
        let server = setup_with(test_config(), Arc::new(DisabledAnalyzer));
        let response = server
            .post("/api/diet/analyze")
            .json(&json!({ "image": "YWJj" }))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}

mod reminder {
    use super::*;

    #[tokio::test]
    async fn sends_when_no_workout_today() {
        let server = setup();
        let response = server.post("/api/reminder/test").await;

        response.assert_status_ok();
        let body: ReminderOutcome = response.json();
        assert!(body.sent);
    }

    #[tokio::test]
    async fn stays_quiet_after_completing_a_workout() {
        let server = setup();
        let session = start_session(&server).await;
        server
            .put(&format!("/api/workout/{}/complete", session.id))
            .json(&complete_body(2400))
            .await;

        let body: ReminderOutcome = server.post("/api/reminder/test").await.json();
        assert!(!body.sent);
        assert_eq!(body.message, "Workout already completed today");
    }
}
