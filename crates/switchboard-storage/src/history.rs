//! Conversation history stores.
//!
//! A store keeps the `{role, content}` turns of each conversation in append
//! order. `get` returns the most recent turns, oldest first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::OptionalExtension;
use tracing::debug;

use switchboard_core::error::SwitchboardError;
use switchboard_core::types::{ConversationId, HistoryEntry, MessageRole, Timestamp};

use crate::db::Database;

/// Persistence collaborator for conversation history.
///
/// Implementations need not serialize concurrent writers to the same
/// conversation; the chat service does that.
pub trait HistoryStore: Send + Sync {
    /// The last `limit` entries of a conversation, oldest first.
    fn get(&self, id: &ConversationId, limit: usize) -> Result<Vec<HistoryEntry>, SwitchboardError>;

    /// Append entries to a conversation, creating it if needed.
    fn put(&self, id: &ConversationId, entries: &[HistoryEntry]) -> Result<(), SwitchboardError>;

    /// Delete a conversation. Returns whether it existed.
    fn clear(&self, id: &ConversationId) -> Result<bool, SwitchboardError>;
}

// =============================================================================
// SQLite
// =============================================================================

/// History store backed by the SQLite database.
pub struct SqliteHistoryStore {
    db: Arc<Database>,
}

impl SqliteHistoryStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn storage_err(context: &str) -> impl Fn(rusqlite::Error) -> SwitchboardError + '_ {
    move |e| SwitchboardError::Storage(format!("{}: {}", context, e))
}

impl HistoryStore for SqliteHistoryStore {
    fn get(&self, id: &ConversationId, limit: usize) -> Result<Vec<HistoryEntry>, SwitchboardError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT m.role, m.content, m.created_at
                     FROM messages m
                     JOIN conversations c ON c.id = m.conversation_id
                     WHERE c.user_id = ?1 AND c.thread_id = ?2
                     ORDER BY m.seq DESC
                     LIMIT ?3",
                )
                .map_err(storage_err("Failed to prepare history query"))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![id.user_id, id.thread_id, limit as i64],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .map_err(storage_err("Failed to read history"))?;

            let mut entries = Vec::new();
            for row in rows {
                let (role, content, created_at) = row.map_err(storage_err("Failed to read history row"))?;
                let role: MessageRole = role.parse().map_err(SwitchboardError::Storage)?;
                entries.push(HistoryEntry {
                    role,
                    content,
                    created_at: Timestamp(created_at),
                });
            }
            entries.reverse();
            Ok(entries)
        })
    }

    fn put(&self, id: &ConversationId, entries: &[HistoryEntry]) -> Result<(), SwitchboardError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(storage_err("Failed to begin transaction"))?;

            tx.execute(
                "INSERT INTO conversations (user_id, thread_id) VALUES (?1, ?2)
                 ON CONFLICT (user_id, thread_id)
                 DO UPDATE SET updated_at = strftime('%s', 'now')",
                rusqlite::params![id.user_id, id.thread_id],
            )
            .map_err(storage_err("Failed to upsert conversation"))?;

            let (conversation_id, last_seq): (i64, i64) = tx
                .query_row(
                    "SELECT c.id, COALESCE(MAX(m.seq), 0)
                     FROM conversations c
                     LEFT JOIN messages m ON m.conversation_id = c.id
                     WHERE c.user_id = ?1 AND c.thread_id = ?2
                     GROUP BY c.id",
                    rusqlite::params![id.user_id, id.thread_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(storage_err("Failed to read conversation"))?;

            {
                let mut insert = tx
                    .prepare(
                        "INSERT INTO messages (conversation_id, seq, role, content, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(storage_err("Failed to prepare insert"))?;
                for (offset, entry) in entries.iter().enumerate() {
                    insert
                        .execute(rusqlite::params![
                            conversation_id,
                            last_seq + 1 + offset as i64,
                            entry.role.to_string(),
                            entry.content,
                            entry.created_at.0,
                        ])
                        .map_err(storage_err("Failed to append message"))?;
                }
            }

            tx.commit().map_err(storage_err("Failed to commit history"))?;
            debug!(conversation = %id, appended = entries.len(), "History appended");
            Ok(())
        })
    }

    fn clear(&self, id: &ConversationId) -> Result<bool, SwitchboardError> {
        self.db.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM conversations WHERE user_id = ?1 AND thread_id = ?2",
                    rusqlite::params![id.user_id, id.thread_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_err("Failed to look up conversation"))?;
            let Some(conversation_id) = existing else {
                return Ok(false);
            };
            conn.execute(
                "DELETE FROM conversations WHERE id = ?1",
                rusqlite::params![conversation_id],
            )
            .map_err(storage_err("Failed to delete conversation"))?;
            debug!(conversation = %id, "History cleared");
            Ok(true)
        })
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// History store held in process memory. Used by tests and by stateless
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    conversations: Mutex<HashMap<ConversationId, Vec<HistoryEntry>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ConversationId, Vec<HistoryEntry>>>, SwitchboardError>
    {
        self.conversations
            .lock()
            .map_err(|e| SwitchboardError::Storage(format!("history lock poisoned: {}", e)))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get(&self, id: &ConversationId, limit: usize) -> Result<Vec<HistoryEntry>, SwitchboardError> {
        let conversations = self.lock()?;
        let entries = conversations.get(id).map(Vec::as_slice).unwrap_or_default();
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }

    fn put(&self, id: &ConversationId, entries: &[HistoryEntry]) -> Result<(), SwitchboardError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.lock()?
            .entry(id.clone())
            .or_default()
            .extend_from_slice(entries);
        Ok(())
    }

    fn clear(&self, id: &ConversationId) -> Result<bool, SwitchboardError> {
        Ok(self.lock()?.remove(id).is_some())
    }
}
