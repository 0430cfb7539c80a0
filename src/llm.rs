//! Itinerary generation through an OpenAI-compatible chat completion API
//!
//! All wire types are private to this module; callers only see
//! [`ItineraryGenerator`] and plain strings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::LlmConfig;
use crate::prompt::Prompt;
use crate::{Result, TripPlannerError};

/// Anything that turns a prompt into itinerary text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    /// One completion round-trip; the text is returned as produced
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// Client for `POST {base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .map_err(|e| TripPlannerError::general(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ItineraryGenerator for ChatCompletionClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        // Checked per request so the server still starts without a key
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TripPlannerError::config("AI service"))?;

        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(prompt_len = prompt.user.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.endpoint, error = %e, "completion request failed");
                if e.is_timeout() {
                    TripPlannerError::llm("the AI service did not respond in time")
                } else {
                    TripPlannerError::llm(format!("could not reach the AI service: {e}"))
                }
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize completion response");
            TripPlannerError::llm(format!("unexpected response from the AI service: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TripPlannerError::llm("the AI service returned an empty response"))?;

        debug!(response_len = text.len(), "received completion");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    error!(%status, %detail, "completion request returned HTTP error");

    let message = match status {
        StatusCode::UNAUTHORIZED => "the AI service rejected the API key".to_string(),
        StatusCode::TOO_MANY_REQUESTS => {
            "the AI service is rate limiting requests, please try again shortly".to_string()
        }
        _ => format!("the AI service returned HTTP {}", status.as_u16()),
    };
    Err(TripPlannerError::llm(message))
}
