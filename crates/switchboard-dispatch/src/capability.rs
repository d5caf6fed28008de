//! Capability traits and their structured outputs.
//!
//! The classifier, the role agents and the reviewer are opaque external
//! calls. The coordinator only depends on these traits, so deterministic
//! stubs and language-model adapters are interchangeable.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_core::types::Message;

use crate::error::CapabilityError;

/// Routing target meaning "stop, the conversation is complete".
pub const TERMINAL_SENTINEL: &str = "FINISH";

/// Raw classifier output, before the coordinator checks it against the
/// registered alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Role identifier or [`TERMINAL_SENTINEL`].
    #[serde(alias = "next")]
    pub target: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub information: String,
    /// Terminal message, required when `target` is the sentinel.
    #[serde(default)]
    pub final_output: Option<String>,
}

impl RoutingDecision {
    pub fn dispatch(
        target: impl Into<String>,
        action: impl Into<String>,
        information: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
            information: information.into(),
            final_output: None,
        }
    }

    pub fn finish(final_output: impl Into<String>) -> Self {
        Self {
            target: TERMINAL_SENTINEL.to_string(),
            action: String::new(),
            information: String::new(),
            final_output: Some(final_output.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.target.trim() == TERMINAL_SENTINEL
    }
}

/// The instruction a role agent receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub action: String,
    pub information: String,
}

impl Directive {
    /// Text of the directive as it is recorded in history.
    pub fn render(&self) -> String {
        if self.information.is_empty() {
            format!("Conduct the following action: {}", self.action)
        } else {
            format!(
                "Conduct the following action: {} with this information: {}",
                self.action, self.information
            )
        }
    }
}

/// A routing decision after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<R> {
    Dispatch { role: R, directive: Directive },
    Finish { message: String },
}

/// Reviewer verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approved => write!(f, "approved"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

/// Reviewer output. `text` is the final answer on approval and the
/// corrective feedback on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    #[serde(alias = "approval")]
    pub verdict: Verdict,
    #[serde(alias = "response")]
    pub text: String,
}

impl ReviewDecision {
    pub fn approved(text: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Approved,
            text: text.into(),
        }
    }

    pub fn rejected(text: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Rejected,
            text: text.into(),
        }
    }
}

/// Maps a conversation to a routing decision.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, history: &[Message]) -> Result<RoutingDecision, CapabilityError>;
}

/// A responder specialized for one role.
#[async_trait]
pub trait RoleAgent: Send + Sync {
    /// Answer `directive`, with `context` being the most recent
    /// user-authored message.
    async fn respond(&self, directive: &Directive, context: &str)
        -> Result<String, CapabilityError>;
}

/// Validates or rewrites a candidate answer against the original request.
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    async fn review(
        &self,
        original_request: &str,
        candidate: &str,
    ) -> Result<ReviewDecision, CapabilityError>;
}
