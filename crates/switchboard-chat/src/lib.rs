//! Chat service for Switchboard.
//!
//! Wraps one coordinator run with everything around it: input validation,
//! loading prior turns, per-conversation serialization, the run timeout,
//! and appending the new turn to history.

pub mod error;
pub mod service;

pub use error::ChatError;
pub use service::{ChatEngine, ChatReply, ChatService};
