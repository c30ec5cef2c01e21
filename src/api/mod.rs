mod handlers;
pub mod middleware;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::Database;
use crate::nutrition::{analyzer_from_config, FoodAnalyzer};
use crate::reminder::{notifier_from_config, ReminderService};
use crate::schedule::{WeeklySchedule, DEFAULT_REST_DAY};

pub use handlers::ApiError;
use middleware::{rate_limit_middleware, RateLimiter};

/// Photos arrive base64-encoded inside JSON.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub schedule: Arc<WeeklySchedule>,
    pub analyzer: Arc<dyn FoodAnalyzer>,
    pub reminder: ReminderService,
}

impl AppState {
    /// Wire the analyzer and notifier the configuration asks for.
    pub fn new(db: Database, config: AppConfig) -> Self {
        let analyzer = analyzer_from_config(&config.vision);
        let notifier = notifier_from_config(&config.reminder);
        Self::with_services(db, config, analyzer, notifier)
    }

    pub fn with_services(
        db: Database,
        config: AppConfig,
        analyzer: Arc<dyn FoodAnalyzer>,
        notifier: Arc<dyn crate::reminder::Notifier>,
    ) -> Self {
        let reminder = ReminderService::new(
            db.clone(),
            notifier,
            &config.reminder,
            config.utc_offset,
            DEFAULT_REST_DAY,
        );
        Self {
            db,
            config: Arc::new(config),
            schedule: Arc::new(WeeklySchedule::default()),
            analyzer,
            reminder,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }
}

pub fn create_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(state.config.auth_rate_limit, Duration::from_secs(60))
        .trust_proxy(state.config.trust_proxy);

    let auth = Router::new()
        .route("/verify", post(handlers::verify_password))
        .layer(from_fn_with_state(limiter, rate_limit_middleware));

    let api = Router::new()
        .nest("/auth", auth)
        // Workout
        .route("/workout/start", post(handlers::start_session))
        .route("/workout/{id}/complete", put(handlers::complete_session))
        .route("/workout/history", get(handlers::get_history))
        .route("/workout/today", get(handlers::get_today_session))
        .route("/workout/schedule", get(handlers::get_schedule))
        .route("/workout/stats", get(handlers::get_stats))
        // Diet
        .route("/diet/analyze", post(handlers::analyze_food))
        .route("/diet/log", post(handlers::log_meal))
        .route("/diet/today", get(handlers::get_today_diet))
        .route("/diet/meal/{id}", delete(handlers::delete_meal))
        .route("/diet/cleanup", delete(handlers::cleanup_diets))
        // Reminder
        .route("/reminder/test", post(handlers::trigger_reminder))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
