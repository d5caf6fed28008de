//! SQLite handle for the history store.
//!
//! History writes are short and per-conversation serialized upstream, so
//! one connection behind a mutex is enough. Every query goes through
//! [`Database::with_conn`].

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use switchboard_core::error::SwitchboardError;

use crate::migrations;

/// The history database, migrated to the current schema on open.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the file at `path`. A busy timeout lets a second
    /// process wait out short write locks instead of failing.
    pub fn new(path: &Path) -> Result<Self, SwitchboardError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| SwitchboardError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| SwitchboardError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());
        Self::init(conn)
    }

    /// Private in-memory database. Nothing survives the handle.
    pub fn in_memory() -> Result<Self, SwitchboardError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SwitchboardError::Storage(format!("Failed to open in-memory db: {}", e))
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| SwitchboardError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, SwitchboardError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SwitchboardError>
    where
        F: FnOnce(&Connection) -> Result<T, SwitchboardError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SwitchboardError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_conversations(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
                .map_err(|e| SwitchboardError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_conversations(&db), 0);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let db = Database::new(&path).unwrap();
        assert_eq!(count_conversations(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("wal.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(|e| SwitchboardError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        drop(Database::new(&path).unwrap());
        let db = Database::new(&path).unwrap();
        assert_eq!(count_conversations(&db), 0);
    }
}
