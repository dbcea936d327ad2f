//! Chat-completion client
//!
//! Talks to an OpenAI-compatible gateway (`POST {base_url}/chat/completions`)
//! with a fixed model. Replies are free text; [`extract_json_block`] recovers
//! the JSON object the prompts ask for.

use crate::config::LlmConfig;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("valid json fence regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```\s*([\s\S]*?)\s*```").expect("valid fence regex"));

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
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

/// A single completion request; the model comes from the client
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Anything that can answer a chat request with text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Return the text of the first choice (empty when the reply has none)
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// Wire format of the request body
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for the chat-completion gateway
pub struct GatewayClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EvalError::Http)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl ChatCompletion for GatewayClient {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        debug!(
            "Calling chat completion ({} messages, model {})",
            request.messages.len(),
            self.config.model
        );

        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(EvalError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Chat completion failed with status {}", status);
            return Err(EvalError::LlmApi(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| EvalError::LlmApi(format!("Failed to parse response: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}

/// Pick the JSON payload out of a model reply
///
/// A ```` ```json ```` fence wins, then any ```` ``` ```` fence, else the
/// whole reply. An empty fence also falls back to the whole reply.
pub fn extract_json_block(text: &str) -> &str {
    let fenced = JSON_FENCE
        .captures(text)
        .or_else(|| ANY_FENCE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty());
    fenced.unwrap_or(text)
}

/// Decode the JSON payload of a reply, `None` when it does not parse
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Option<T> {
    match serde_json::from_str(extract_json_block(text)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Model reply is not valid JSON: {}", e);
            None
        }
    }
}
