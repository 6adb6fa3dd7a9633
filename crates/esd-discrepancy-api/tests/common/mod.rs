//! Shared fixtures for router tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use esd_discrepancy_api::chat::ChatMessage;
use esd_discrepancy_api::services::{
    ChatStore, CompletionError, CompletionRequest, CompletionService, InMemoryChatStore,
    StaticTokenSessions, StoreError, StoredChat,
};
use esd_discrepancy_api::{create_router, AppState, ServerConfig};

pub const ALICE_TOKEN: &str = "tok-alice";
pub const BOB_TOKEN: &str = "tok-bob";

/// Completion service that replays canned replies and records requests
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<ChatMessage, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: CompletionError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatMessage::assistant("(script exhausted)")))
    }
}

/// Store whose writes always fail
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl ChatStore for FailingStore {
    async fn save_chat(&self, _: &str, _: &str, _: Vec<ChatMessage>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn get_chat(&self, _: &str) -> Result<Option<StoredChat>, StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn delete_chat(&self, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.completion.max_tool_rounds = 2;
    config
}

fn sessions() -> Arc<StaticTokenSessions> {
    let tokens: HashMap<String, String> = [
        (ALICE_TOKEN.to_string(), "alice".to_string()),
        (BOB_TOKEN.to_string(), "bob".to_string()),
    ]
    .into();
    Arc::new(StaticTokenSessions::new(tokens))
}

pub fn state_with(
    completion: Arc<dyn CompletionService>,
    chats: Arc<dyn ChatStore>,
) -> AppState {
    AppState::new(&test_config(), sessions(), chats, completion).unwrap()
}

pub struct Harness {
    pub state: AppState,
    pub completion: Arc<ScriptedCompletion>,
    pub chats: Arc<InMemoryChatStore>,
}

impl Harness {
    pub fn new(completion: ScriptedCompletion) -> Self {
        let completion = Arc::new(completion);
        let chats = Arc::new(InMemoryChatStore::new());
        let state = state_with(completion.clone(), chats.clone());
        Self {
            state,
            completion,
            chats,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}

pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}
