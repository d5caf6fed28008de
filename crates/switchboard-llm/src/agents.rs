//! Capability implementations backed by a [`ChatBackend`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use switchboard_core::types::Message;
use switchboard_dispatch::{
    CapabilityError, Classifier, Directive, ReviewAgent, ReviewDecision, Role, RoleAgent,
    RoutingDecision,
};

use crate::backend::ChatBackend;
use crate::parse::parse_structured;
use crate::prompts;

/// Classifier that asks the model for a routing decision.
pub struct LlmClassifier<R: Role> {
    backend: Arc<dyn ChatBackend>,
    _roles: PhantomData<R>,
}

impl<R: Role> LlmClassifier<R> {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            _roles: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Role> Classifier for LlmClassifier<R> {
    async fn classify(&self, history: &[Message]) -> Result<RoutingDecision, CapabilityError> {
        let messages = prompts::classifier_messages::<R>(history);
        let reply = self.backend.complete(&messages, true).await?;
        let decision: RoutingDecision = parse_structured(&reply)?;
        tracing::info!(target_role = %decision.target, "Classifier decision");
        Ok(decision)
    }
}

/// Role agent answering in free text.
pub struct LlmRoleAgent<R: Role> {
    role: R,
    backend: Arc<dyn ChatBackend>,
}

impl<R: Role> LlmRoleAgent<R> {
    pub fn new(role: R, backend: Arc<dyn ChatBackend>) -> Self {
        Self { role, backend }
    }
}

#[async_trait]
impl<R: Role> RoleAgent for LlmRoleAgent<R> {
    async fn respond(&self, directive: &Directive, context: &str) -> Result<String, CapabilityError> {
        let messages = prompts::role_messages(self.role, directive, context);
        let reply = self.backend.complete(&messages, false).await?;
        Ok(reply.trim().to_string())
    }
}

/// Reviewer asking the model for an approval verdict.
pub struct LlmReviewAgent {
    domain: String,
    backend: Arc<dyn ChatBackend>,
}

impl LlmReviewAgent {
    pub fn new(domain: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            domain: domain.into(),
            backend,
        }
    }

    /// Reviewer for the domain of alphabet `R`.
    pub fn for_roles<R: Role>(backend: Arc<dyn ChatBackend>) -> Self {
        Self::new(R::domain(), backend)
    }
}

#[async_trait]
impl ReviewAgent for LlmReviewAgent {
    async fn review(
        &self,
        original_request: &str,
        candidate: &str,
    ) -> Result<ReviewDecision, CapabilityError> {
        let messages = prompts::reviewer_messages(&self.domain, original_request, candidate);
        let reply = self.backend.complete(&messages, true).await?;
        let decision: ReviewDecision = parse_structured(&reply)?;
        tracing::info!(verdict = %decision.verdict, "Review decision");
        Ok(decision)
    }
}
