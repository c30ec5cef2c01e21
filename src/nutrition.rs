//! Food-image analysis.
//!
//! The estimate is display-only: nothing here touches the diet log. The user
//! decides whether to log what the model proposed.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::VisionConfig;
use crate::models::FoodRecord;

const MAX_TOKENS: u32 = 600;

const PROMPT: &str = r#"Analyze this food image and estimate the nutritional information.

IMPORTANT:
1. Identify the food items visible in the image
2. Estimate the QUANTITY/PORTION SIZE (e.g., "1 cup", "2 pieces", "300g", "1 plate")
3. Calculate nutritional values based on the estimated quantity

Return ONLY a valid JSON object with no additional text:
{
  "name": "descriptive food name",
  "quantity": "estimated portion size",
  "calories": number,
  "protein": number,
  "carbs": number,
  "fat": number,
  "fiber": number,
  "vitamins": ["Vitamin A", "Iron", etc.]
}

Be realistic with nutritional values for the portion size."#;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Food analysis is not configured")]
    Disabled,

    #[error("Vision request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Vision service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("No JSON found in response")]
    NoJson,

    #[error("Failed to parse food analysis: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Turns a photo of a meal into a nutrition estimate.
#[async_trait]
pub trait FoodAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> Result<FoodRecord, AnalysisError>;
}

/// Used when no API key is configured.
pub struct DisabledAnalyzer;

#[async_trait]
impl FoodAnalyzer for DisabledAnalyzer {
    async fn analyze(&self, _image: &[u8]) -> Result<FoodRecord, AnalysisError> {
        Err(AnalysisError::Disabled)
    }
}

/// Talks to an OpenAI-compatible chat completion endpoint with vision support.
pub struct GroqAnalyzer {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl GroqAnalyzer {
    pub fn new(url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(&self, image: &[u8]) -> serde_json::Value {
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(image)
        );
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "max_tokens": MAX_TOKENS
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl FoodAnalyzer for GroqAnalyzer {
    async fn analyze(&self, image: &[u8]) -> Result<FoodRecord, AnalysisError> {
        tracing::debug!(bytes = image.len(), model = %self.model, "analyzing food image");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Failed to analyze food")
                .to_string();
            return Err(AnalysisError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(reply = %reply, "vision reply");
        parse_reply(&reply)
    }
}

/// Build the analyzer the configuration asks for.
pub fn analyzer_from_config(config: &VisionConfig) -> Arc<dyn FoodAnalyzer> {
    match &config.api_key {
        Some(key) => Arc::new(GroqAnalyzer::new(&config.url, &config.model, key)),
        None => {
            tracing::info!("No vision API key configured, food analysis disabled");
            Arc::new(DisabledAnalyzer)
        }
    }
}

/// Pull the food record out of a model reply, ignoring any prose around it.
pub fn parse_reply(reply: &str) -> Result<FoodRecord, AnalysisError> {
    let json = extract_json_object(reply).ok_or(AnalysisError::NoJson)?;
    Ok(serde_json::from_str(json)?)
}

/// The span from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decode the base64 payload the web client uploads. Tolerates a data-URL prefix.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    general_purpose::STANDARD.decode(payload.trim())
}
