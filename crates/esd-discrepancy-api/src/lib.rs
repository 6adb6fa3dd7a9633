//! ESD Discrepancy API
//!
//! HTTP service around the discrepancy registry:
//! - a thin chat gateway that lets a language model report cataloged
//!   discrepancies through tool calls
//! - endpoints to query, validate, register and classify records
//! - health and Prometheus metrics
//!
//! Sessions, chat persistence and the completion model sit behind the
//! [`services`] traits so they can be swapped or faked in tests.

pub mod chat;
pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod services;
pub mod state;

pub use chat::{ChatMessage, Conversation, Role, ToolCall, TurnOutcome};
pub use config::ServerConfig;
pub use error::{ApiError, StartupError};
pub use handler::{create_router, ApiResponse, REQUEST_ID_HEADER};
pub use metrics::ApiMetrics;
pub use state::AppState;
