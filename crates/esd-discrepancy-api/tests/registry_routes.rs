//! Registry, tool and operations endpoints

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use esd_discrepancy_api::REQUEST_ID_HEADER;

use common::{send, Harness, ScriptedCompletion};

fn harness() -> Harness {
    Harness::new(ScriptedCompletion::default())
}

fn candidate() -> serde_json::Value {
    json!({
        "description": "Gas detection trip votes 2oo3 in implementation, 1oo1 in design.",
        "parameters": {
            "designCauseTag": "DS_GD0300",
            "designCauseDescription": "Gas detector high",
            "implementedCauseTags": ["GD0300_A", "GD0300_B", "GD0300_C"],
            "implementedCauseDescriptions": ["Detector A", "Detector B", "Detector C"],
            "effectTag": "cESDV3001",
            "effectDescription": "Inlet ESD valve",
            "discrepancyType": "MoreComplexLogic",
            "notes": "Voting layer absent from design."
        }
    })
}

#[tokio::test]
async fn list_all_and_filtered() {
    let h = harness();

    let (status, body) = send(h.router(), Method::GET, "/discrepancies", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (_, body) = send(
        h.router(),
        Method::GET,
        "/discrepancies?type=TriggerMediation",
        None,
        None,
    )
    .await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["parameters"]["effectTags"], json!(["cSOVX1", "cSOVY1"]));

    let (_, body) = send(
        h.router(),
        Method::GET,
        "/discrepancies?cause_tag=DS_HS0001&effect_tag=cESDV2047",
        None,
        None,
    )
    .await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["parameters"]["discrepancyType"], "DirectTriggerMissing");
}

#[tokio::test]
async fn list_with_unknown_type_is_bad_request() {
    let (status, body) = send(
        harness().router(),
        Method::GET,
        "/discrepancies?type=Nonsense",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn register_then_query() {
    let h = harness();

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies",
        None,
        Some(candidate()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["parameters"]["effectTags"], json!(["cESDV3001"]));

    let (_, body) = send(
        h.router(),
        Method::GET,
        "/discrepancies?cause_tag=DS_GD0300",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies",
        None,
        Some(candidate()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_RECORD");
}

#[tokio::test]
async fn register_invalid_candidate() {
    let mut bad = candidate();
    bad["parameters"]["implementedCauseDescriptions"] = json!(["Detector A"]);

    let h = harness();
    let (status, body) = send(h.router(), Method::POST, "/discrepancies", None, Some(bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "ARITY_MISMATCH");

    let (_, metrics) = send(h.router(), Method::GET, "/metrics", None, None).await;
    assert!(metrics
        .as_str()
        .unwrap()
        .contains("esd_validation_failures_total{code=\"ARITY_MISMATCH\"} 1"));
}

#[tokio::test]
async fn validate_reports_without_registering() {
    let h = harness();

    let mut linted = candidate();
    linted["parameters"]["effectTag"] = json!("cESDV-3001");
    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies/validate",
        None,
        Some(linted),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["lints"][0]["tag"], "cESDV-3001");

    let mut missing = candidate();
    missing["parameters"].as_object_mut().unwrap().remove("discrepancyType");
    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies/validate",
        None,
        Some(missing),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["error"]["code"], "UNKNOWN_DISCREPANCY_TYPE");

    assert_eq!(h.state.registry.read().await.len(), 5);
}

#[tokio::test]
async fn classify_endpoint() {
    let h = harness();

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies/classify",
        None,
        Some(json!({
            "designCauseTag": "DS_HS0001",
            "implementedCauseTags": ["DS_HS0001", "DS_HS0002", "M_SS0"],
            "designHasDirectEffect": true,
            "implementationHasDirectEffect": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discrepancyType"], "TriggerMediation");

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/discrepancies/classify",
        None,
        Some(json!({
            "designCauseTag": "DS_HS0001",
            "implementedCauseTags": ["DS_HS0001"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNCLASSIFIED_DISCREPANCY");
}

#[tokio::test]
async fn types_and_tools() {
    let h = harness();

    let (_, body) = send(h.router(), Method::GET, "/discrepancies/types", None, None).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 6);
    assert!(names.contains(&"UndocumentedBypassLogic".to_string()));

    let (_, body) = send(h.router(), Method::GET, "/tools", None, None).await;
    let tools = body["data"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[3]["name"], "SOVX1_SOVY1");
    assert_eq!(
        tools[0]["parameters"]["properties"]["designCauseTag"]["const"],
        "DS_HS0001"
    );
}

#[tokio::test]
async fn health_and_request_id() {
    let h = harness();
    let (status, body) = send(h.router(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["records"], 5);
    assert_eq!(body["tools"], 5);

    let (_, body) = send(h.router(), Method::GET, "/discrepancies/types", None, None).await;
    assert!(uuid::Uuid::parse_str(body["metadata"]["request_id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn error_envelope_carries_request_id() {
    let h = harness();
    let existing = serde_json::to_string(&h.state.registry.read().await.records()[0]).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/discrepancies")
        .header(REQUEST_ID_HEADER, "req-duplicate-1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(existing))
        .unwrap();

    let response = h.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-duplicate-1");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "DUPLICATE_RECORD");
    assert_eq!(body["metadata"]["request_id"], "req-duplicate-1");
}

#[tokio::test]
async fn metrics_track_record_count() {
    let h = harness();
    send(
        h.router(),
        Method::POST,
        "/discrepancies",
        None,
        Some(candidate()),
    )
    .await;

    let (status, body) = send(h.router(), Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("esd_registered_records 6"));
}
