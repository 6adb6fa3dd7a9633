//! Request id assignment and request logging

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::ErrorInfo;
use crate::error::error_response;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The request id set by [`request_logging_middleware`], or a fresh one
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Ensure every request carries an `x-request-id` and log its outcome
///
/// A caller-supplied id is kept; otherwise one is generated. The id is
/// echoed on the response, and error envelopes are re-rendered to carry it.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request_id(request.headers());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::debug!(request_id = %request_id, method = %method, uri = %uri, "Request started");

    let mut response = next.run(request).await;

    if let Some(error) = response.extensions_mut().remove::<ErrorInfo>() {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %response.status(),
            code = %error.code,
            duration_ms = %start.elapsed().as_millis(),
            "Request failed"
        );
        response = error_response(response.status(), error, request_id.clone());
        response.extensions_mut().remove::<ErrorInfo>();
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %start.elapsed().as_millis(),
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
