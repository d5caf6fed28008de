//! Deterministic capability stubs.
//!
//! The scripted stubs record every call and serve tests across the
//! workspace. The static stubs keep no state and back the `--mock` mode of
//! the app, which runs the dispatch loop without a language-model endpoint.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use switchboard_core::types::Message;

use crate::capability::{Classifier, Directive, ReviewAgent, ReviewDecision, RoleAgent, RoutingDecision};
use crate::error::CapabilityError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays a script of results. The last entry repeats once the script
/// runs out.
#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<Result<T, CapabilityError>>,
    last: Option<Result<T, CapabilityError>>,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Result<T, CapabilityError>>) -> Self {
        Self {
            queue: steps.into(),
            last: None,
        }
    }

    fn next(&mut self) -> Result<T, CapabilityError> {
        if let Some(step) = self.queue.pop_front() {
            self.last = Some(step.clone());
            return step;
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(CapabilityError::Malformed("script is empty".to_string())))
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifier stub returning scripted routing decisions.
#[derive(Debug)]
pub struct ScriptedClassifier {
    script: Mutex<Script<RoutingDecision>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClassifier {
    pub fn new(steps: Vec<Result<RoutingDecision, CapabilityError>>) -> Self {
        Self {
            script: Mutex::new(Script::new(steps)),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always return `decision`.
    pub fn always(decision: RoutingDecision) -> Self {
        Self::new(vec![Ok(decision)])
    }

    /// Route every request to `target` with a generic action.
    pub fn always_route(target: &str) -> Self {
        Self::always(RoutingDecision::dispatch(
            target,
            "handle the user query",
            "",
        ))
    }

    pub fn failing(err: CapabilityError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Every history view the classifier was shown, in call order.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, history: &[Message]) -> Result<RoutingDecision, CapabilityError> {
        lock(&self.seen).push(history.to_vec());
        let result = lock(&self.script).next();
        tracing::debug!(ok = result.is_ok(), "Mock classification");
        result
    }
}

// =============================================================================
// Role agent
// =============================================================================

/// Role agent stub answering every directive with the same text.
#[derive(Debug)]
pub struct CannedRole {
    reply: Result<String, CapabilityError>,
    directives: Mutex<Vec<Directive>>,
    contexts: Mutex<Vec<String>>,
}

impl CannedRole {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            directives: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: CapabilityError) -> Self {
        Self {
            reply: Err(err),
            directives: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> usize {
        lock(&self.directives).len()
    }

    pub fn directives(&self) -> Vec<Directive> {
        lock(&self.directives).clone()
    }

    pub fn contexts(&self) -> Vec<String> {
        lock(&self.contexts).clone()
    }
}

#[async_trait]
impl RoleAgent for CannedRole {
    async fn respond(&self, directive: &Directive, context: &str) -> Result<String, CapabilityError> {
        lock(&self.directives).push(directive.clone());
        lock(&self.contexts).push(context.to_string());
        self.reply.clone()
    }
}

// =============================================================================
// Reviewer
// =============================================================================

/// Reviewer stub returning scripted verdicts.
#[derive(Debug)]
pub struct ScriptedReviewer {
    script: Mutex<Script<ReviewDecision>>,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedReviewer {
    pub fn new(steps: Vec<Result<ReviewDecision, CapabilityError>>) -> Self {
        Self {
            script: Mutex::new(Script::new(steps)),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(decision: ReviewDecision) -> Self {
        Self::new(vec![Ok(decision)])
    }

    /// Approve every candidate, passing it through unchanged.
    pub fn passthrough() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    /// `(original_request, candidate)` pairs, in call order.
    pub fn seen(&self) -> Vec<(String, String)> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl ReviewAgent for ScriptedReviewer {
    async fn review(
        &self,
        original_request: &str,
        candidate: &str,
    ) -> Result<ReviewDecision, CapabilityError> {
        lock(&self.seen).push((original_request.to_string(), candidate.to_string()));
        let mut script = lock(&self.script);
        if script.queue.is_empty() && script.last.is_none() {
            return Ok(ReviewDecision::approved(candidate));
        }
        script.next()
    }
}

// =============================================================================
// Static stubs
// =============================================================================

/// Classifier routing every conversation to one target.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    target: String,
}

impl StaticClassifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, history: &[Message]) -> Result<RoutingDecision, CapabilityError> {
        let information = history.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(RoutingDecision::dispatch(
            self.target.clone(),
            "handle the user query",
            information,
        ))
    }
}

/// Role agent answering every directive with the same text.
#[derive(Debug, Clone)]
pub struct StaticRole {
    reply: String,
}

impl StaticRole {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl RoleAgent for StaticRole {
    async fn respond(&self, _: &Directive, _: &str) -> Result<String, CapabilityError> {
        Ok(self.reply.clone())
    }
}

/// Reviewer approving every candidate unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovingReviewer;

#[async_trait]
impl ReviewAgent for ApprovingReviewer {
    async fn review(&self, _: &str, candidate: &str) -> Result<ReviewDecision, CapabilityError> {
        Ok(ReviewDecision::approved(candidate))
    }
}
