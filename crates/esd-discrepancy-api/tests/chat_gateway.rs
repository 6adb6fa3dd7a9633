//! Chat gateway: sessions, tool execution, persistence

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;

use esd_discrepancy_api::chat::{ChatMessage, Role, ToolCall};
use esd_discrepancy_api::services::{ChatStore, CompletionError};
use esd_discrepancy_api::create_router;

use common::{send, state_with, FailingStore, Harness, ScriptedCompletion, ALICE_TOKEN, BOB_TOKEN};

fn question() -> serde_json::Value {
    json!({
        "id": "chat-1",
        "messages": [
            { "role": "user", "content": "Does DS_HS0001 alone close SDV0140?" },
            { "role": "user", "content": "" }
        ]
    })
}

#[tokio::test]
async fn chat_requires_session() {
    let h = Harness::new(ScriptedCompletion::default());
    let (status, body) = send(h.router(), Method::POST, "/api/chat", None, Some(question())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(h.completion.requests().is_empty());
}

#[tokio::test]
async fn plain_answer_is_saved() {
    let h = Harness::new(ScriptedCompletion::new([ChatMessage::assistant(
        "No. The implementation also requires DS_HS0002 and M_SS0.",
    )]));

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 1);
    assert!(body["data"]["reports"].as_array().unwrap().is_empty());

    // Empty message dropped before the model sees it
    let requests = h.completion.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].tools.len(), 5);
    assert!(requests[0].system.contains("**SDV0140**"));

    let chat = h.chats.get_chat("chat-1").await.unwrap().unwrap();
    assert_eq!(chat.user_id, "alice");
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn tool_call_reports_discrepancy() {
    let h = Harness::new(ScriptedCompletion::new([
        ChatMessage::tool_request(vec![ToolCall::new(
            "call_1",
            "SDV0140",
            &json!({
                "designCauseTag": "DS_HS0001",
                "notes": "Implementation ANDs the button with DS_HS0002 and M_SS0."
            }),
        )]),
        ChatMessage::assistant("Reported an AdditionalConditionsRequired discrepancy."),
    ]));

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["reports"][0]["status"], "reported");
    assert_eq!(data["reports"][0]["discrepancy"], "AdditionalConditionsRequired");
    let messages = data["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "tool");
    assert_eq!(messages[1]["tool_call_id"], "call_1");

    // Second completion sees the tool result
    let requests = h.completion.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.last().unwrap().role, Role::Tool);

    let (_, metrics) = send(h.router(), Method::GET, "/metrics", None, None).await;
    let metrics = metrics.as_str().unwrap();
    assert!(metrics.contains(
        "esd_discrepancies_reported_total{discrepancy_type=\"AdditionalConditionsRequired\"} 1"
    ));
    assert!(metrics.contains("esd_chat_requests_total{result=\"ok\"} 1"));
}

#[tokio::test]
async fn unknown_tool_returns_error_payload() {
    let h = Harness::new(ScriptedCompletion::new([
        ChatMessage::tool_request(vec![ToolCall::new("call_1", "getWeather", &json!({}))]),
        ChatMessage::assistant("That tool is not available."),
    ]));

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tool_result: serde_json::Value =
        serde_json::from_str(body["data"]["messages"][1]["content"].as_str().unwrap()).unwrap();
    assert_eq!(tool_result["status"], "error");
    assert_eq!(tool_result["code"], "UNKNOWN_TOOL");
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let looping = (0..10).map(|i| {
        ChatMessage::tool_request(vec![ToolCall::new(
            format!("call_{}", i),
            "ESDV2047",
            &json!({}),
        )])
    });
    let h = Harness::new(ScriptedCompletion::new(looping));

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // max_tool_rounds = 2 in the test config: rounds 0, 1 and 2
    assert_eq!(h.completion.requests().len(), 3);
    assert_eq!(body["data"]["reports"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let h = Harness::new(ScriptedCompletion::failing(CompletionError::Status {
        status: 503,
        message: "overloaded".to_string(),
    }));

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert!(h.chats.get_chat("chat-1").await.unwrap().is_none());
}

#[tokio::test]
async fn save_failure_does_not_fail_turn() {
    let completion = Arc::new(ScriptedCompletion::new([ChatMessage::assistant("ok")]));
    let state = state_with(completion, Arc::new(FailingStore));

    let (status, body) = send(
        create_router(state),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn post_to_another_users_chat_is_rejected() {
    let h = Harness::new(ScriptedCompletion::new([ChatMessage::assistant("bob reply")]));
    h.chats
        .save_chat("chat-a", "alice", vec![ChatMessage::user("alice secret")])
        .await
        .unwrap();

    let (status, body) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(BOB_TOKEN),
        Some(json!({
            "id": "chat-a",
            "messages": [{ "role": "user", "content": "bob text" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(h.completion.requests().is_empty());

    let chat = h.chats.get_chat("chat-a").await.unwrap().unwrap();
    assert_eq!(chat.user_id, "alice");
    assert_eq!(chat.messages.len(), 1);
    assert_eq!(chat.messages[0].content.as_deref(), Some("alice secret"));
}

#[tokio::test]
async fn owner_can_continue_chat() {
    let h = Harness::new(ScriptedCompletion::new([ChatMessage::assistant("again")]));
    h.chats
        .save_chat("chat-1", "alice", vec![ChatMessage::user("earlier")])
        .await
        .unwrap();

    let (status, _) = send(
        h.router(),
        Method::POST,
        "/api/chat",
        Some(ALICE_TOKEN),
        Some(question()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let chat = h.chats.get_chat("chat-1").await.unwrap().unwrap();
    assert_eq!(chat.user_id, "alice");
    assert_eq!(chat.messages.last().unwrap().content.as_deref(), Some("again"));
}

#[tokio::test]
async fn delete_chat_rules() {
    let h = Harness::new(ScriptedCompletion::default());
    h.chats
        .save_chat("chat-1", "alice", vec![ChatMessage::user("hello")])
        .await
        .unwrap();

    let (status, _) = send(h.router(), Method::DELETE, "/api/chat", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(h.router(), Method::DELETE, "/api/chat?id=chat-1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        h.router(),
        Method::DELETE,
        "/api/chat?id=chat-1",
        Some(BOB_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.chats.get_chat("chat-1").await.unwrap().is_some());

    let (status, body) = send(
        h.router(),
        Method::DELETE,
        "/api/chat?id=chat-1",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Chat deleted");
    assert!(h.chats.get_chat("chat-1").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_with_store_failure_is_internal_error() {
    let state = state_with(
        Arc::new(ScriptedCompletion::default()),
        Arc::new(FailingStore),
    );
    let (status, _) = send(
        create_router(state),
        Method::DELETE,
        "/api/chat?id=chat-1",
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn get_chat_for_owner_only() {
    let h = Harness::new(ScriptedCompletion::default());
    h.chats
        .save_chat("chat-9", "alice", vec![ChatMessage::user("hello")])
        .await
        .unwrap();

    let (status, body) = send(h.router(), Method::GET, "/api/chat/chat-9", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messages"][0]["content"], "hello");

    let (status, _) = send(h.router(), Method::GET, "/api/chat/chat-9", Some(BOB_TOKEN), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(h.router(), Method::GET, "/api/chat/nope", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
