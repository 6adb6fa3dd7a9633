//! Caller sessions resolved from request headers

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Resolves the caller's session from request headers
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `None` when the request carries no valid session
    async fn session(&self, headers: &HeaderMap) -> Option<Session>;
}

/// Bearer tokens mapped to user ids, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSessions {
    tokens: HashMap<String, String>,
}

impl StaticTokenSessions {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

#[async_trait]
impl SessionProvider for StaticTokenSessions {
    async fn session(&self, headers: &HeaderMap) -> Option<Session> {
        let token = bearer_token(headers)?;
        self.tokens.get(token).map(|user_id| Session {
            user_id: user_id.clone(),
        })
    }
}
