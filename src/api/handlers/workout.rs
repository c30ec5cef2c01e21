use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Days, NaiveTime};
use uuid::Uuid;

use super::ApiError;
use crate::api::AppState;
use crate::db::HISTORY_LIMIT;
use crate::models::*;
use crate::schedule::DEFAULT_REST_DAY;
use crate::stats::{self, CompletedSession, STREAK_WINDOW_DAYS};

pub async fn start_session(
    State(state): State<AppState>,
    Json(input): Json<StartSessionInput>,
) -> Result<Json<SessionResponse>, ApiError> {
    if input.day.trim().is_empty() {
        return Err(ApiError::BadRequest("Day is required".to_string()));
    }

    let session = state.db.create_session(input)?;
    tracing::info!(id = %session.id, day = %session.day, "session started");
    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

pub async fn complete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CompleteSessionInput>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .db
        .complete_session(id, input)?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    tracing::info!(id = %session.id, duration = session.total_duration, "session completed");
    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let sessions = state.db.get_history(HISTORY_LIMIT)?;
    Ok(Json(HistoryResponse {
        success: true,
        sessions,
    }))
}

pub async fn get_today_session(
    State(state): State<AppState>,
) -> Result<Json<TodaySessionResponse>, ApiError> {
    let session = state
        .db
        .get_session_for_day(state.today(), &state.config.utc_offset)?;
    Ok(Json(TodaySessionResponse {
        success: true,
        session,
    }))
}

pub async fn get_schedule(State(state): State<AppState>) -> Json<ScheduleResponse> {
    let workout = state.schedule.for_date(state.today()).clone();
    Json(ScheduleResponse {
        success: true,
        rest_day: workout.is_rest_day(),
        workout,
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let today = state.today();
    let offset = state.config.utc_offset;
    let window_start = today
        .checked_sub_days(Days::new(STREAK_WINDOW_DAYS))
        .unwrap_or(today);
    let since = (window_start.and_time(NaiveTime::MIN) - offset).and_utc();

    let sessions: Vec<CompletedSession> = state
        .db
        .get_completed_since(since)?
        .iter()
        .filter_map(|s| CompletedSession::from_summary(s, &offset))
        .collect();

    Ok(Json(StatsResponse {
        success: true,
        stats: stats::summarize(&sessions, today, DEFAULT_REST_DAY),
    }))
}
