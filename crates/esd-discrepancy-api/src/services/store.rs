//! Chat persistence
//!
//! Chats are keyed by id and owned by the user that created them. Ownership
//! checks happen in the handlers; the store only records the owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::chat::ChatMessage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Chat store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChat {
    pub id: String,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation persistence
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert or replace the messages of chat `id`
    async fn save_chat(
        &self,
        id: &str,
        user_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<(), StoreError>;

    async fn get_chat(&self, id: &str) -> Result<Option<StoredChat>, StoreError>;

    async fn delete_chat(&self, id: &str) -> Result<(), StoreError>;
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<String, StoredChat>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn save_chat(
        &self,
        id: &str,
        user_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut chats = self.chats.write().await;
        chats
            .entry(id.to_string())
            .and_modify(|chat| {
                chat.messages = messages.clone();
                chat.updated_at = now;
            })
            .or_insert_with(|| StoredChat {
                id: id.to_string(),
                user_id: user_id.to_string(),
                messages,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn get_chat(&self, id: &str) -> Result<Option<StoredChat>, StoreError> {
        Ok(self.chats.read().await.get(id).cloned())
    }

    async fn delete_chat(&self, id: &str) -> Result<(), StoreError> {
        self.chats.write().await.remove(id);
        Ok(())
    }
}
