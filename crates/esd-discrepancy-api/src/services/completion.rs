//! Completion service client
//!
//! [`HttpCompletionClient`] speaks the OpenAI chat-completions wire format,
//! which most hosted and local model servers accept. Transient failures
//! (network errors, 429, 5xx) are retried with exponential backoff;
//! authentication and request errors are not.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use esd_discrepancy_core::ToolDefinition;

use crate::chat::{ChatMessage, Role};
use crate::config::CompletionConfig;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Completion service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Completion service rejected credentials: {0}")]
    Unauthorized(u16),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Errors that will not go away on retry
    pub fn is_permanent(&self) -> bool {
        match self {
            CompletionError::Http(_) => false,
            CompletionError::Status { status, .. } => {
                *status != StatusCode::TOO_MANY_REQUESTS.as_u16() && *status < 500
            }
            CompletionError::Unauthorized(_) | CompletionError::InvalidResponse(_) => true,
        }
    }
}

/// Everything the model sees for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// A language model that may answer with text or tool calls
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produce the next assistant message
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

/// OpenAI-compatible chat-completions client
pub struct HttpCompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl HttpCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!(ChatMessage::new(Role::System, request.system.as_str())));
        messages.extend(request.messages.iter().map(|m| json!(m)));

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            let tools: Vec<_> = request
                .tools
                .iter()
                .map(|function| FunctionTool {
                    kind: "function",
                    function,
                })
                .collect();
            body["tools"] = json!(tools);
        }
        body
    }

    async fn send(&self, url: &str, body: &Value) -> Result<ChatMessage, CompletionError> {
        let mut builder = self.client.post(url).json(body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| CompletionError::InvalidResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError> {
        let url = self.endpoint();
        let body = self.request_body(&request);

        let mut last_error = None;
        let mut backoff_ms = self.config.initial_backoff_ms;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(attempt, backoff_ms, "Retrying completion request");
                sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2).min(self.config.max_backoff_ms);
            }

            match self.send(&url, &body).await {
                Ok(message) => return Ok(message),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Completion request failed");
                    let permanent = e.is_permanent();
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| CompletionError::Http("no attempt was made".to_string())))
    }
}
