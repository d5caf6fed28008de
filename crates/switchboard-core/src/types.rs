use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Speaker tag carried by every message in a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "human" => Ok(MessageRole::User),
            "assistant" | "ai" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

/// Which component produced a message.
///
/// `Caller` marks the question supplied by the external caller for the
/// current run. `Prior` marks turns replayed from the history store, so an
/// earlier question is never mistaken for the current one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Origin {
    Caller,
    Prior,
    Classifier,
    Coordinator,
    Role(String),
    Reviewer,
}

impl Origin {
    /// Short label used in logs and persisted rows.
    pub fn label(&self) -> &str {
        match self {
            Origin::Caller => "caller",
            Origin::Prior => "prior",
            Origin::Classifier => "classifier",
            Origin::Coordinator => "coordinator",
            Origin::Role(name) => name.as_str(),
            Origin::Reviewer => "reviewer",
        }
    }

    /// Messages the coordinator writes for its own bookkeeping.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(self, Origin::Classifier | Origin::Coordinator)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deployment variant, selecting which role alphabet the coordinator runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Customer support: billing, technical, general information.
    #[default]
    Support,
    /// Travel planning: budget, itinerary, destination knowledge and visas.
    Travel,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Support => write!(f, "support"),
            Variant::Travel => write!(f, "travel"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "support" => Ok(Variant::Support),
            "travel" => Ok(Variant::Travel),
            _ => Err(format!("Unknown variant: {}", s)),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// One entry in a conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>, origin: Option<Origin>) -> Self {
        Self {
            role,
            content: content.into(),
            origin,
        }
    }

    /// The question supplied by the caller for the current run.
    pub fn caller(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, Some(Origin::Caller))
    }

    /// A turn replayed from the history store.
    pub fn prior(role: MessageRole, content: impl Into<String>) -> Self {
        Self::new(role, content, Some(Origin::Prior))
    }

    pub fn is_from_caller(&self) -> bool {
        self.origin == Some(Origin::Caller)
    }
}

/// Identity of a conversation: one user, one thread.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId {
    pub user_id: String,
    pub thread_id: String,
}

impl ConversationId {
    pub fn new(user_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.thread_id)
    }
}

/// A persisted `{role, content}` pair, as read from or written to the
/// history store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Convert into a history message for a new run.
    pub fn into_prior_message(self) -> Message {
        Message::prior(self.role, self.content)
    }
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}
