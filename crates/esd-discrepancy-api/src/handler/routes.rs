//! Route definitions
//!
//! - POST/DELETE /api/chat, GET /api/chat/:id - chat gateway
//! - GET/POST /discrepancies - query and register records
//! - GET /discrepancies/types - the discrepancy type enumeration
//! - POST /discrepancies/validate - validate without registering
//! - POST /discrepancies/classify - suggest a type
//! - GET /tools - tool schemas shown to the model
//! - GET /health, GET /metrics

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use esd_discrepancy_core::{
    lint_tags, validate, ClassificationInput, DiscrepancyRecord, DiscrepancyType, ToolDefinition,
};

use super::chat::{delete_chat, get_chat, post_chat};
use super::{
    request_id, request_logging_middleware, ApiResponse, ClassificationResult,
    DiscrepancyQuery, DiscrepancyTypeInfo, ErrorInfo, HealthResponse, ValidationOutcome,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        // Chat gateway
        .route("/api/chat", post(post_chat).delete(delete_chat))
        .route("/api/chat/:id", get(get_chat))
        // Registry
        .route("/discrepancies", get(list_discrepancies).post(register_discrepancy))
        .route("/discrepancies/types", get(list_types))
        .route("/discrepancies/validate", post(validate_discrepancy))
        .route("/discrepancies/classify", post(classify_discrepancy))
        .route("/tools", get(list_tools))
        // Operations
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// GET /discrepancies
pub async fn list_discrepancies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DiscrepancyQuery>,
) -> Result<Json<ApiResponse<Vec<DiscrepancyRecord>>>, ApiError> {
    let discrepancy_type = query
        .discrepancy_type
        .as_deref()
        .map(str::parse::<DiscrepancyType>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let registry = state.registry.read().await;
    let records = registry
        .records()
        .iter()
        .filter(|r| {
            query
                .cause_tag
                .as_deref()
                .map_or(true, |tag| r.design_cause_tag() == tag)
        })
        .filter(|r| query.effect_tag.as_deref().map_or(true, |tag| r.has_effect_tag(tag)))
        .filter(|r| discrepancy_type.map_or(true, |t| r.discrepancy_type() == t))
        .cloned()
        .collect();

    Ok(Json(ApiResponse::success(records, request_id(&headers))))
}

/// POST /discrepancies - validate and register, 201 on success
pub async fn register_discrepancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(candidate): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<DiscrepancyRecord>>), ApiError> {
    let record = validate(&candidate).map_err(|e| {
        state.metrics.record_validation_failure(e.code());
        ApiError::from(e)
    })?;

    let mut registry = state.registry.write().await;
    registry.register(record.clone())?;
    state.metrics.set_record_count(registry.len());
    drop(registry);

    tracing::info!(
        design_cause_tag = %record.design_cause_tag(),
        discrepancy_type = %record.discrepancy_type(),
        "Registered discrepancy"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record, request_id(&headers))),
    ))
}

/// POST /discrepancies/validate
///
/// Always 200; `valid` says whether the candidate passed.
pub async fn validate_discrepancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(candidate): Json<Value>,
) -> Json<ApiResponse<ValidationOutcome>> {
    let outcome = match validate(&candidate) {
        Ok(record) => ValidationOutcome {
            valid: true,
            lints: lint_tags(&record),
            record: Some(record),
            error: None,
        },
        Err(e) => {
            state.metrics.record_validation_failure(e.code());
            ValidationOutcome {
                valid: false,
                record: None,
                error: Some(ErrorInfo::new(e.code(), e.to_string())),
                lints: Vec::new(),
            }
        }
    };

    Json(ApiResponse::success(outcome, request_id(&headers)))
}

/// POST /discrepancies/classify
pub async fn classify_discrepancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ClassificationInput>,
) -> Result<Json<ApiResponse<ClassificationResult>>, ApiError> {
    let discrepancy_type = state.classifier.classify(&input)?;
    let result = ClassificationResult {
        discrepancy_type,
        label: discrepancy_type.label().to_string(),
    };
    Ok(Json(ApiResponse::success(result, request_id(&headers))))
}

/// GET /discrepancies/types
pub async fn list_types(headers: HeaderMap) -> Json<ApiResponse<Vec<DiscrepancyTypeInfo>>> {
    let types = DiscrepancyType::ALL
        .iter()
        .map(|t| DiscrepancyTypeInfo {
            name: *t,
            label: t.label().to_string(),
        })
        .collect();
    Json(ApiResponse::success(types, request_id(&headers)))
}

/// GET /tools
pub async fn list_tools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<Vec<ToolDefinition>>> {
    let tools = state.tools.definitions().cloned().collect();
    Json(ApiResponse::success(tools, request_id(&headers)))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let records = state.registry.read().await.len();
    let status = if records > 0 && !state.tools.is_empty() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        records,
        tools: state.tools.len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
