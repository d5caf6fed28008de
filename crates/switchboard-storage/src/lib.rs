//! Switchboard storage crate: conversation history persistence.
//!
//! Provides a WAL-mode SQLite database with migrations, the
//! [`HistoryStore`] collaborator trait, and SQLite and in-memory
//! implementations of it.

pub mod db;
pub mod history;
pub mod migrations;

pub use db::Database;
pub use history::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
