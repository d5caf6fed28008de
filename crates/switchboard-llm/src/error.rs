//! LLM error types.

use switchboard_dispatch::CapabilityError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<LlmError> for CapabilityError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Network(msg) => CapabilityError::Transport(msg),
            LlmError::Timeout(secs) => CapabilityError::Timeout(secs),
            LlmError::Api { status, body } => {
                CapabilityError::Upstream(format!("status {}: {}", status, body))
            }
            LlmError::InvalidResponse(msg) => CapabilityError::Upstream(msg),
            LlmError::Configuration(msg) => CapabilityError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LlmError::Timeout(60).to_string(), "Request timed out after 60s");
        assert_eq!(
            LlmError::Api {
                status: 401,
                body: "invalid api key".into()
            }
            .to_string(),
            "API error 401: invalid api key"
        );
    }

    #[test]
    fn test_into_capability_error() {
        assert_eq!(
            CapabilityError::from(LlmError::Network("dns".into())),
            CapabilityError::Transport("dns".into())
        );
        assert_eq!(
            CapabilityError::from(LlmError::Timeout(5)),
            CapabilityError::Timeout(5)
        );
        assert!(matches!(
            CapabilityError::from(LlmError::Api {
                status: 429,
                body: "slow down".into()
            }),
            CapabilityError::Upstream(msg) if msg.contains("429")
        ));
    }
}
