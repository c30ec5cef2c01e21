//! HTTP client for the gymtrack API.
//!
//! Used by the terminal runner and the `stats` command. The base URL comes
//! from `GYMTRACK_URL` (default: `http://localhost:7777/api`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DEFAULT_CLIENT_URL;
use crate::models::*;
use crate::runner::SessionStore;
use crate::stats::ActivitySummary;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Error bodies are `{"success": false, "message": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct GymClient {
    base_url: String,
    client: Client,
}

impl GymClient {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("GYMTRACK_URL").unwrap_or_else(|_| DEFAULT_CLIENT_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(message)),
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(message)),
                _ => Err(ClientError::Server(format!("{}: {}", status, message))),
            }
        }
    }

    // ============================================================
    // Auth
    // ============================================================

    pub async fn verify_password(&self, password: &str) -> Result<MessageResponse, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/auth/verify")
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Workout Operations
    // ============================================================

    pub async fn start_session(
        &self,
        input: &StartSessionInput,
    ) -> Result<WorkoutSession, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/workout/start")
            .json(input)
            .send()
            .await?;
        let body: SessionResponse = self.handle_response(response).await?;
        Ok(body.session)
    }

    pub async fn complete_session(
        &self,
        id: Uuid,
        input: &CompleteSessionInput,
    ) -> Result<WorkoutSession, ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/workout/{}/complete", id))
            .json(input)
            .send()
            .await?;
        let body: SessionResponse = self.handle_response(response).await?;
        Ok(body.session)
    }

    pub async fn get_history(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/workout/history")
            .send()
            .await?;
        let body: HistoryResponse = self.handle_response(response).await?;
        Ok(body.sessions)
    }

    pub async fn get_today_session(&self) -> Result<Option<WorkoutSession>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/workout/today")
            .send()
            .await?;
        let body: TodaySessionResponse = self.handle_response(response).await?;
        Ok(body.session)
    }

    pub async fn get_schedule(&self) -> Result<ScheduleResponse, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/workout/schedule")
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn get_stats(&self) -> Result<ActivitySummary, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/workout/stats")
            .send()
            .await?;
        let body: StatsResponse = self.handle_response(response).await?;
        Ok(body.stats)
    }

    // ============================================================
    // Diet Operations
    // ============================================================

    pub async fn log_meal(&self, food: &FoodRecord) -> Result<MealLogged, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/diet/log")
            .json(food)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn get_today_diet(&self) -> Result<DietDay, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/diet/today")
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete_meal(&self, id: Uuid) -> Result<MessageResponse, ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/diet/meal/{}", id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Reminder
    // ============================================================

    pub async fn trigger_reminder(&self) -> Result<ReminderOutcome, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/reminder/test")
            .send()
            .await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl SessionStore for GymClient {
    async fn create_session(&self, input: &StartSessionInput) -> anyhow::Result<Uuid> {
        let session = self.start_session(input).await?;
        Ok(session.id)
    }

    async fn complete_session(
        &self,
        id: Uuid,
        report: &CompleteSessionInput,
    ) -> anyhow::Result<()> {
        GymClient::complete_session(self, id, report).await?;
        Ok(())
    }
}
