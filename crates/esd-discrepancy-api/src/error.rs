//! API and startup error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

use esd_discrepancy_core::{RegistryError, ValidationError};

use crate::handler::{ApiResponse, ErrorInfo};
use crate::services::{CompletionError, StoreError};

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(RegistryError),

    #[error("Completion service failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(e) => e.code(),
            ApiError::Registry(e) => e.code(),
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Registry(RegistryError::DuplicateRecord { .. }) => StatusCode::CONFLICT,
            ApiError::Registry(RegistryError::CatalogParse(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Registry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(e) => ApiError::Validation(e),
            other => ApiError::Registry(other),
        }
    }
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "Request failed");
        }

        let error_info = ErrorInfo::new(self.error_code(), self.to_string());
        error_response(status, error_info, uuid::Uuid::new_v4().to_string())
    }
}

/// Error envelope response
///
/// The [`ErrorInfo`] also rides along as a response extension so the
/// request logging middleware can re-render the body with the request's
/// `x-request-id`.
pub(crate) fn error_response(status: StatusCode, error: ErrorInfo, request_id: String) -> Response {
    let mut response =
        (status, Json(ApiResponse::<()>::error(error.clone(), request_id))).into_response();
    response.extensions_mut().insert(error);
    response
}

/// Failures while assembling the server from configuration
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load catalog: {0}")]
    Catalog(#[from] RegistryError),

    #[error("Failed to initialize metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
