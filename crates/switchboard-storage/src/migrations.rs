//! Database schema migrations.
//!
//! Applies the conversation history schema and tracks applied versions in
//! `schema_migrations`.

use rusqlite::Connection;
use tracing::info;

use switchboard_core::error::SwitchboardError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), SwitchboardError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SwitchboardError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| {
            SwitchboardError::Storage(format!("Failed to query migration version: {}", e))
        })?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: conversation_history");
    }

    Ok(())
}

/// Version 1: conversations and their ordered messages.
fn apply_v1(conn: &Connection) -> Result<(), SwitchboardError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            thread_id   TEXT NOT NULL,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (user_id, thread_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            conversation_id INTEGER NOT NULL
                            REFERENCES conversations (id) ON DELETE CASCADE,
            seq             INTEGER NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant', 'system')),
            content         TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            PRIMARY KEY (conversation_id, seq)
        );

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'conversation_history');
        ",
    )
    .map_err(|e| SwitchboardError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();
        let (version, rows): (i64, i64) = conn
            .query_row(
                "SELECT MAX(version), COUNT(*) FROM schema_migrations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_conversation_key_unique() {
        let conn = open_test_conn();
        conn.execute(
            "INSERT INTO conversations (user_id, thread_id) VALUES ('u', 't')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO conversations (user_id, thread_id) VALUES ('u', 't')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_messages_role_check() {
        let conn = open_test_conn();
        conn.execute(
            "INSERT INTO conversations (user_id, thread_id) VALUES ('u', 't')",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES (1, 1, 'tool', 'x', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_cascades_to_messages() {
        let conn = open_test_conn();
        conn.execute(
            "INSERT INTO conversations (user_id, thread_id) VALUES ('u', 't')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (conversation_id, seq, role, content, created_at)
             VALUES (1, 1, 'user', 'hello', 0)",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM conversations WHERE id = 1", []).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
