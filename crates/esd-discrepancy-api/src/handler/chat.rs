//! Chat gateway endpoints

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use super::{request_id, ApiResponse, ChatIdQuery, ChatRequest, ChatResponse};
use crate::chat::{filter_empty, Conversation};
use crate::error::ApiError;
use crate::services::{Session, StoredChat};
use crate::state::AppState;

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    state
        .sessions
        .session(headers)
        .await
        .ok_or(ApiError::Unauthorized)
}

/// POST /api/chat
///
/// Runs one turn: the non-empty request messages go to the model together
/// with the system prompt and tool schemas, tool calls are executed against
/// the registry, and the request plus response messages are saved under the
/// chat id. Posting to another user's chat id is rejected with 401. A store
/// failure is logged and does not fail the turn.
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    let request_id = request_id(&headers);
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(e) => {
            state.metrics.record_chat("unauthorized");
            return Err(e);
        }
    };

    // A chat id belongs to whoever created it
    match state.chats.get_chat(&request.id).await {
        Ok(Some(chat)) if chat.user_id != session.user_id => {
            tracing::warn!(
                request_id = %request_id,
                chat_id = %request.id,
                user_id = %session.user_id,
                "Chat owned by another user"
            );
            state.metrics.record_chat("unauthorized");
            return Err(ApiError::Unauthorized);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                chat_id = %request.id,
                error = %e,
                "Chat lookup failed; continuing without history check"
            );
        }
    }

    let messages = filter_empty(request.messages);
    tracing::info!(
        request_id = %request_id,
        chat_id = %request.id,
        user_id = %session.user_id,
        messages = messages.len(),
        "Chat turn started"
    );

    let conversation = Conversation {
        completion: state.completion.as_ref(),
        registry: &state.registry,
        tools: &state.tools,
        system_prompt: &state.system_prompt,
        max_tool_rounds: state.max_tool_rounds,
    };

    let outcome = match conversation.run(&messages).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.record_chat("upstream_error");
            return Err(e.into());
        }
    };

    let mut transcript = messages;
    transcript.extend(outcome.messages.iter().cloned());
    if let Err(e) = state
        .chats
        .save_chat(&request.id, &session.user_id, transcript)
        .await
    {
        tracing::error!(
            request_id = %request_id,
            chat_id = %request.id,
            error = %e,
            "Failed to save chat"
        );
    }

    state.metrics.record_chat("ok");
    tracing::info!(
        request_id = %request_id,
        chat_id = %request.id,
        reports = outcome.reports.len(),
        "Chat turn completed"
    );

    let response = ChatResponse {
        id: request.id,
        messages: outcome.messages,
        reports: outcome.reports,
    };
    Ok(Json(ApiResponse::success(response, request_id)))
}

/// DELETE /api/chat?id=
pub async fn delete_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChatIdQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::NotFound("chat id is required".to_string()))?;
    let session = require_session(&state, &headers).await?;

    owned_chat(&state, &id, &session).await?;
    state.chats.delete_chat(&id).await?;

    tracing::info!(chat_id = %id, user_id = %session.user_id, "Chat deleted");
    Ok(Json(ApiResponse::success(
        json!({ "id": id, "message": "Chat deleted" }),
        request_id(&headers),
    )))
}

/// GET /api/chat/:id
pub async fn get_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredChat>>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let chat = owned_chat(&state, &id, &session).await?;
    Ok(Json(ApiResponse::success(chat, request_id(&headers))))
}

/// The chat `id` if it exists and belongs to the caller
async fn owned_chat(state: &AppState, id: &str, session: &Session) -> Result<StoredChat, ApiError> {
    let chat = state
        .chats
        .get_chat(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("chat {}", id)))?;

    if chat.user_id != session.user_id {
        tracing::warn!(chat_id = %id, user_id = %session.user_id, "Chat owned by another user");
        return Err(ApiError::Unauthorized);
    }
    Ok(chat)
}
