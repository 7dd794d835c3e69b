//! Shared request plumbing for the upstream APIs
//!
//! xAI (Grok) and v0 both expose OpenAI-style chat completion endpoints, so
//! their request/response shapes live here next to the generic sender.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Send a request and decode a JSON body, classifying every failure
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await.map_err(ApiError::from_transport)?;
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::ParseError(e.to_string())
            }
        });
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), truncate(&error_text, 500)))
}

/// Cut `text` to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Live-search citations (xAI only)
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Content of the first choice, if non-empty
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .filter(|c| !c.trim().is_empty())
    }
}

/// POST a chat completion with bearer auth
pub async fn chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<ChatResponse, ApiError> {
    send_json(
        client
            .post(url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(request),
    )
    .await
}
