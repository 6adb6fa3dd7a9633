//! HTTP handlers
//!
//! - `routes`: router assembly and the registry endpoints
//! - `chat`: the chat gateway endpoints
//! - `middleware`: request ids and request logging
//!
//! Every JSON body is wrapped in [`ApiResponse`].

pub mod chat;
pub mod middleware;
pub mod routes;

pub use middleware::{request_id, request_logging_middleware, REQUEST_ID_HEADER};
pub use routes::create_router;

use serde::{Deserialize, Serialize};

use esd_discrepancy_core::{DiscrepancyRecord, DiscrepancyReport, DiscrepancyType, TagLint};

use crate::chat::ChatMessage;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub metadata: ResponseMetadata,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ResponseMetadata::new(request_id),
        }
    }

    pub fn error(error: ErrorInfo, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            metadata: ResponseMetadata::new(request_id),
        }
    }
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub request_id: String,
    /// ISO 8601
    pub timestamp: String,
    pub version: String,
}

impl ResponseMetadata {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Query parameters for `GET /discrepancies`; filters combine
#[derive(Debug, Default, Deserialize)]
pub struct DiscrepancyQuery {
    pub cause_tag: Option<String>,
    pub effect_tag: Option<String>,
    #[serde(rename = "type")]
    pub discrepancy_type: Option<String>,
}

/// Outcome of `POST /discrepancies/validate`
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DiscrepancyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Advisory tag convention warnings
    pub lints: Vec<TagLint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub discrepancy_type: DiscrepancyType,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscrepancyTypeInfo {
    pub name: DiscrepancyType,
    pub label: String,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Response to `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    /// Assistant replies and tool results produced for this turn
    pub messages: Vec<ChatMessage>,
    pub reports: Vec<DiscrepancyReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub records: usize,
    pub tools: usize,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub version: String,
}
