//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path, query, or body parameters via axum
//! extractors, calls the chat engine, and returns JSON.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use switchboard_core::types::{ConversationId, MessageRole, Variant};

use crate::error::ApiError;
use crate::state::AppState;

/// Default and maximum page size for conversation history.
const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    /// Thread to continue. A new thread is started when omitted.
    pub thread_id: Option<String>,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BannerResponse {
    pub message: String,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub variant: Variant,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    /// Processing time in seconds.
    pub time_taken: f64,
    pub conversation: ConversationId,
    pub verdict: String,
    pub termination: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub conversation: ConversationId,
    pub messages: Vec<HistoryMessage>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - liveness banner.
pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Switchboard is running".to_string(),
        datetime: Utc::now(),
    })
}

/// GET /health - status, version, uptime and the active role set.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        variant: state.config.general.variant,
        roles: state.engine.roles().into_iter().map(String::from).collect(),
    })
}

/// POST /chat - answer one question.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let thread_id = match body.thread_id {
        Some(thread) => thread,
        None => Uuid::new_v4().to_string(),
    };
    let id = ConversationId::new(body.user_id, thread_id);

    let reply = state
        .engine
        .handle(id, &body.question)
        .await
        .map_err(|e| {
            if !e.is_client_error() {
                tracing::warn!(error = %e, "Chat request failed");
            }
            ApiError::from_chat(e, &state.config.coordinator.failure_text)
        })?;

    Ok(Json(ChatResponse {
        message: reply.message,
        time_taken: reply.time_taken,
        conversation: reply.conversation,
        verdict: reply.verdict.to_string(),
        termination: reply.termination.to_string(),
    }))
}

/// GET /conversations/{user_id}/{thread_id} - stored turns, oldest first.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let id = ConversationId::new(user_id, thread_id);

    let entries = state
        .engine
        .history(&id, limit)
        .await
        .map_err(|e| ApiError::from_chat(e, &state.config.coordinator.failure_text))?;
    if entries.is_empty() {
        return Err(ApiError::NotFound(format!("Conversation {} not found", id)));
    }

    Ok(Json(HistoryResponse {
        conversation: id,
        messages: entries
            .into_iter()
            .map(|entry| HistoryMessage {
                role: entry.role,
                content: entry.content,
                created_at: entry.created_at.to_datetime(),
            })
            .collect(),
    }))
}

/// DELETE /conversations/{user_id}/{thread_id} - clear stored turns.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path((user_id, thread_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = ConversationId::new(user_id, thread_id);
    let existed = state
        .engine
        .clear(&id)
        .await
        .map_err(|e| ApiError::from_chat(e, &state.config.coordinator.failure_text))?;
    if existed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Conversation {} not found", id)))
    }
}
