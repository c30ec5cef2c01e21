mod diet;
mod workout;

pub use diet::*;
pub use workout::*;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::models::{MessageResponse, ReminderOutcome};

// ============================================================
// Error Handling
// ============================================================

/// A failed request. Renders as `{"success": false, "message": ...}`.
///
/// Internal causes are logged server-side and replaced by a generic message so
/// storage details never reach the client.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    BadGateway(String),
    Unavailable(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        if status.is_client_error() {
            tracing::warn!("Request rejected: {}", message);
        }

        (
            status,
            Json(MessageResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Gym Tracker API is running"
    }))
}

// ============================================================
// Auth
// ============================================================

#[derive(Debug, Deserialize)]
pub struct VerifyInput {
    #[serde(default)]
    pub password: String,
}

pub async fn verify_password(
    State(state): State<AppState>,
    Json(input): Json<VerifyInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    match &state.config.password {
        Some(expected) if !input.password.is_empty() && input.password == *expected => {
            Ok(Json(MessageResponse::ok("Access granted")))
        }
        _ => Err(ApiError::Unauthorized("Incorrect password".to_string())),
    }
}

// ============================================================
// Reminder
// ============================================================

pub async fn trigger_reminder(
    State(state): State<AppState>,
) -> Result<Json<ReminderOutcome>, ApiError> {
    let outcome = state.reminder.check(state.today()).await?;
    Ok(Json(outcome))
}
