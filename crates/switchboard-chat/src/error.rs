//! Error types for the chat service.

use switchboard_core::error::SwitchboardError;
use switchboard_dispatch::RunError;

/// Errors from the chat service.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("invalid conversation id: {0}")]
    InvalidConversation(String),
    #[error("history store unavailable: {0}")]
    HistoryUnavailable(String),
    #[error("run timed out after {0} seconds")]
    Timeout(u64),
    #[error(transparent)]
    Run(#[from] RunError),
}

impl ChatError {
    /// Errors caused by the request itself rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyQuestion
                | ChatError::QuestionTooLong(_)
                | ChatError::InvalidConversation(_)
                | ChatError::Run(RunError::EmptyRequest)
        )
    }
}

impl From<SwitchboardError> for ChatError {
    fn from(err: SwitchboardError) -> Self {
        ChatError::HistoryUnavailable(err.to_string())
    }
}
