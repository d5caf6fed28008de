//! Chat-completions backend.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol, which most
//! hosted and self-hosted model servers expose. Requests are sent once;
//! failures surface to the caller without retry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use switchboard_core::config::LlmConfig;
use switchboard_core::types::MessageRole;

use crate::error::LlmError;

/// One message of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A model that completes a chat prompt.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete `messages`. With `json_output` the model is asked to reply
    /// with a single JSON object.
    async fn complete(&self, messages: &[PromptMessage], json_output: bool) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible backend.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    config: LlmConfig,
}

impl OpenAiBackend {
    /// Create a backend. The API key must already be resolved into
    /// `config`; nothing is read from the environment here.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.endpoint.trim().is_empty() {
            return Err(LlmError::Configuration("llm.endpoint is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn build_request<'a>(&'a self, messages: &'a [PromptMessage], json_output: bool) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            response_format: json_output.then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, messages: &[PromptMessage], json_output: bool) -> Result<String, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages, json_output);

        let mut builder = self.client.post(self.api_url("/chat/completions")).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Completion received"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(LlmConfig {
            endpoint: "http://localhost:8000/v1/".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        assert_eq!(
            backend().api_url("/chat/completions"),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let result = OpenAiBackend::new(LlmConfig {
            endpoint: " ".to_string(),
            ..LlmConfig::default()
        });
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_request_serialization() {
        let backend = backend();
        let messages = vec![
            PromptMessage::system("route"),
            PromptMessage::user("hello"),
        ];
        let json = serde_json::to_value(backend.build_request(&messages, true)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 1024);

        let json = serde_json::to_value(backend.build_request(&messages, false)).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));

        let empty: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let backend = OpenAiBackend::new(LlmConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        })
        .unwrap();
        let err = backend
            .complete(&[PromptMessage::user("hi")], false)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Network(_) | LlmError::Timeout(_)));
    }
}
