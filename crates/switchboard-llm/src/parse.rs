//! Structured-output parsing.
//!
//! Models asked for JSON still wrap it in prose or Markdown fences now and
//! then. The parser accepts a fenced block, a bare object, or an object
//! embedded in surrounding text; anything else is malformed output.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use switchboard_dispatch::CapabilityError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("Invalid fenced block regex")
});

/// Locate the JSON object in a model reply.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(caps) = FENCED_BLOCK.captures(text) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, CapabilityError> {
    let json = extract_json(text).ok_or_else(|| {
        CapabilityError::Malformed(format!("no JSON object in reply: {}", preview(text)))
    })?;
    serde_json::from_str(json).map_err(|e| CapabilityError::Malformed(e.to_string()))
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
