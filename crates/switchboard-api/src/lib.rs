//! Switchboard API crate - axum HTTP server and route handlers.
//!
//! Exposes the chat service over JSON: a liveness banner, health, the
//! `/chat` endpoint, and read/clear access to stored conversations.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
