//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use switchboard_chat::ChatEngine;
use switchboard_core::config::SwitchboardConfig;

/// Shared application state.
///
/// All fields are cheap to clone; the chat engine does its own locking.
#[derive(Clone)]
pub struct AppState {
    /// Chat service for the configured variant.
    pub engine: Arc<dyn ChatEngine>,
    /// Application configuration, fixed at startup.
    pub config: Arc<SwitchboardConfig>,
    /// Bearer token required on protected routes.
    pub api_token: String,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<dyn ChatEngine>, config: SwitchboardConfig, api_token: String) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            api_token,
            start_time: Instant::now(),
        }
    }
}
