//! Key-value storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the platform-style `get/set/clear` text store the habit document
//!   lives in.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `get` on an absent key returns `None`, never an error.
//! - `set` replaces the whole value for a key.
//! - `clear` removes every key, not only the habit document.

use crate::db::{DbError, DbResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Text key-value store consumed by the document accessor.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> DbResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DbResult<()>;
    fn clear(&self) -> DbResult<()>;
}

/// SQLite-backed key-value store owning its migrated connection.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - Returns `DbError` when the `kv_store` table is missing, which means
    ///   the connection skipped migrations.
    pub fn try_new(conn: Connection) -> DbResult<Self> {
        conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store';",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map_err(DbError::from)
        .and_then(|count| {
            if count == 1 {
                Ok(())
            } else {
                Err(DbError::MissingTable("kv_store"))
            }
        })?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn clear(&self) -> DbResult<()> {
        self.conn.execute("DELETE FROM kv_store;", [])?;
        Ok(())
    }
}
