//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints. Failures of a run never expose partial answers: the body
//! carries the configured failure text and a machine-readable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use switchboard_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "contract_violation").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 422 Unprocessable Entity - valid syntax but semantic validation failure.
    UnprocessableEntity {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - a run failed inside the dispatch loop.
    RunFailed { code: &'static str, message: String },
    /// 503 Service Unavailable - history store not reachable.
    ServiceUnavailable(String),
    /// 504 Gateway Timeout - the run exceeded its time budget.
    Timeout(String),
}

impl ApiError {
    /// Map a chat service error. `failure_text` replaces the message of
    /// every server-side failure.
    pub fn from_chat(err: ChatError, failure_text: &str) -> Self {
        match err {
            ChatError::QuestionTooLong(max) => ApiError::UnprocessableEntity {
                message: err.to_string(),
                details: Some(serde_json::json!({ "max_length": max })),
            },
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            ChatError::HistoryUnavailable(_) => ApiError::ServiceUnavailable(failure_text.to_string()),
            ChatError::Timeout(_) => ApiError::Timeout(failure_text.to_string()),
            ChatError::Run(e) => {
                let code = if e.is_contract_violation() {
                    "contract_violation"
                } else if e.is_capability_failure() {
                    "capability_failure"
                } else {
                    "run_failed"
                };
                ApiError::RunFailed {
                    code,
                    message: failure_text.to_string(),
                }
            }
            _ => ApiError::Internal(failure_text.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::UnprocessableEntity { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable_entity",
                message,
                details,
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
            ApiError::RunFailed { code, message } => (StatusCode::BAD_GATEWAY, code, message, None),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "history_unavailable", msg, None)
            }
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "timeout", msg, None),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
