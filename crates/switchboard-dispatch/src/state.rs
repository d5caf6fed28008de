//! Conversation state threaded through a run.

use switchboard_core::config::ClassifierView;
use switchboard_core::types::{Message, MessageRole, Origin};

use crate::capability::Directive;
use crate::error::RunError;
use crate::role::Role;

/// Current routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<R> {
    Role(R),
    Finish,
}

/// Mutable record of one run.
///
/// `history` is append-only and never empty. `original_request` is the
/// first caller-authored message and never changes afterwards.
#[derive(Debug, Clone)]
pub struct ConversationState<R: Role> {
    history: Vec<Message>,
    original_request: String,
    next_target: Option<Target<R>>,
    plan: Option<Directive>,
}

impl<R: Role> ConversationState<R> {
    /// Start a run from a fresh question.
    pub fn new(question: impl Into<String>) -> Result<Self, RunError> {
        Self::with_prior(Vec::new(), question)
    }

    /// Start a run with earlier turns replayed ahead of the question.
    ///
    /// Prior messages are re-tagged with [`Origin::Prior`] so that the new
    /// question is the only caller-authored entry.
    pub fn with_prior(prior: Vec<Message>, question: impl Into<String>) -> Result<Self, RunError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(RunError::EmptyRequest);
        }

        let mut history: Vec<Message> = prior
            .into_iter()
            .map(|mut m| {
                m.origin = Some(Origin::Prior);
                m
            })
            .collect();
        history.push(Message::caller(question.clone()));

        Ok(Self {
            history,
            original_request: question,
            next_target: None,
            plan: None,
        })
    }

    /// Append a message. Order is preserved; nothing is ever removed.
    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Message> {
        self.history
    }

    pub fn original_request(&self) -> &str {
        &self.original_request
    }

    pub fn next_target(&self) -> Option<Target<R>> {
        self.next_target
    }

    pub fn set_next_target(&mut self, target: Target<R>) {
        self.next_target = Some(target);
    }

    /// Most recent directive issued by the classifier.
    pub fn plan(&self) -> Option<&Directive> {
        self.plan.as_ref()
    }

    pub fn set_plan(&mut self, directive: Directive) {
        self.plan = Some(directive);
    }

    /// Content of the most recent user-authored message.
    pub fn latest_user_message(&self) -> &str {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or(&self.original_request)
    }

    /// Most recent answer produced by any role.
    pub fn latest_role_answer(&self) -> Option<&Message> {
        self.history
            .iter()
            .rev()
            .find(|m| matches!(m.origin, Some(Origin::Role(_))))
    }

    /// The slice of history the classifier sees.
    ///
    /// `Filtered` keeps chronological order and drops coordinator
    /// bookkeeping, leaving prior turns, the caller's question, role answers
    /// and reviewer feedback.
    pub fn classifier_view(&self, view: ClassifierView) -> Vec<Message> {
        match view {
            ClassifierView::Full => self.history.clone(),
            ClassifierView::Filtered => self
                .history
                .iter()
                .filter(|m| !m.origin.as_ref().is_some_and(Origin::is_bookkeeping))
                .cloned()
                .collect(),
        }
    }
}
