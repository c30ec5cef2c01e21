//! The evening "you haven't trained today" reminder.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::ReminderConfig;
use crate::db::Database;
use crate::models::ReminderOutcome;

const SUBJECT: &str = "Exercise Reminder - Get Moving!";
const BODY: &str = "You haven't exercised today yet! Don't chase soreness. Chase consistency.";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned {0}")]
    Status(u16),
}

/// A reminder ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub subject: String,
    pub message: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, reminder: &ReminderMessage) -> Result<(), NotifyError>;
}

/// Writes the reminder to the log. The default when no webhook is set.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, reminder: &ReminderMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = reminder.to.as_deref().unwrap_or("-"),
            subject = %reminder.subject,
            "{}",
            reminder.message
        );
        Ok(())
    }
}

/// Posts the reminder as JSON to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, reminder: &ReminderMessage) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(reminder).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}

pub fn notifier_from_config(config: &ReminderConfig) -> Arc<dyn Notifier> {
    match &config.webhook {
        Some(url) => Arc::new(WebhookNotifier::new(url)),
        None => Arc::new(LogNotifier),
    }
}

/// Checks today's log and nudges the user when nothing was completed.
#[derive(Clone)]
pub struct ReminderService {
    db: Database,
    notifier: Arc<dyn Notifier>,
    recipient: Option<String>,
    time: NaiveTime,
    offset: FixedOffset,
    rest_day: Weekday,
}

impl ReminderService {
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        config: &ReminderConfig,
        offset: FixedOffset,
        rest_day: Weekday,
    ) -> Self {
        Self {
            db,
            notifier,
            recipient: config.recipient.clone(),
            time: config.time,
            offset,
            rest_day,
        }
    }

    /// Send a reminder unless a session was completed on `day`.
    pub async fn check(&self, day: NaiveDate) -> anyhow::Result<ReminderOutcome> {
        if self.db.has_completed_session_on(day, &self.offset)? {
            tracing::info!(%day, "workout completed, no reminder needed");
            return Ok(ReminderOutcome {
                sent: false,
                message: "Workout already completed today".to_string(),
            });
        }

        let reminder = ReminderMessage {
            to: self.recipient.clone(),
            subject: SUBJECT.to_string(),
            message: BODY.to_string(),
        };

        match self.notifier.send(&reminder).await {
            Ok(()) => {
                tracing::info!(%day, "reminder sent");
                Ok(ReminderOutcome {
                    sent: true,
                    message: "Reminder sent".to_string(),
                })
            }
            Err(e) => {
                tracing::error!(%day, error = %e, "failed to send reminder");
                Ok(ReminderOutcome {
                    sent: false,
                    message: format!("Failed to send reminder: {}", e),
                })
            }
        }
    }

    /// The timed check. Returns `None` on the rest day.
    pub async fn scheduled_check(&self, day: NaiveDate) -> anyhow::Result<Option<ReminderOutcome>> {
        if day.weekday() == self.rest_day {
            tracing::info!(%day, "rest day, skipping reminder");
            return Ok(None);
        }
        self.check(day).await.map(Some)
    }

    /// Run the daily check forever at the configured local time.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(time = %self.time.format("%H:%M"), "reminder scheduler started");
        tokio::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&self.offset);
                let fire_at = next_fire_after(now, self.time);
                let wait = (fire_at - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                if let Err(e) = self.scheduled_check(fire_at.date_naive()).await {
                    tracing::error!(error = %e, "reminder check failed");
                }
            }
        })
    }
}

/// The first instant strictly after `now` whose local time is `at`.
pub fn next_fire_after(now: DateTime<FixedOffset>, at: NaiveTime) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    let today = now.date_naive();
    let candidate = offset.from_utc_datetime(&(today.and_time(at) - offset));
    if candidate > now {
        return candidate;
    }
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    offset.from_utc_datetime(&(tomorrow.and_time(at) - offset))
}
