//! rusqlite-backed adapter for the local cache collaborator.
//!
//! Rows are keyed by message identity; writes are INSERT OR REPLACE, so
//! every operation is an idempotent upsert. The full normalized message is
//! stored as a JSON payload next to the columns used for keying and order.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::message::{DeliveryStatus, Message};
use crate::infra::error::AppError;
use crate::usecases::contracts::{CacheError, MessageCache, NewIdentifiers};

#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path).map_err(|source| AppError::CacheOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, path)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(|source| AppError::CacheOpen {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn, Path::new(":memory:"))
    }

    fn with_connection(conn: Connection, path: &Path) -> Result<Self, AppError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages (
                identity TEXT PRIMARY KEY,
                chat_key TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                status TEXT,
                failure_reason TEXT,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_chat
                ON messages(chat_key, timestamp);",
        )
        .map_err(|source| AppError::CacheOpen {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError("cache lock poisoned".to_owned()))
    }
}

fn storage_error(error: impl std::fmt::Display) -> CacheError {
    CacheError(error.to_string())
}

fn insert_message(
    conn: &Connection,
    chat_key: &str,
    message: &Message,
) -> Result<(), CacheError> {
    let payload = serde_json::to_string(message).map_err(storage_error)?;
    conn.execute(
        "INSERT OR REPLACE INTO messages
            (identity, chat_key, timestamp, status, failure_reason, payload)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.identity,
            chat_key,
            message.timestamp_ms,
            message.status.map(|s| s.as_label()),
            message.failure_reason,
            payload,
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

impl MessageCache for SqliteCache {
    fn messages_for(&self, chat_key: &str) -> Result<Vec<Message>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT payload FROM messages WHERE chat_key = ?1 ORDER BY timestamp ASC",
            )
            .map_err(storage_error)?;

        let rows = stmt
            .query_map(params![chat_key], |row| row.get::<_, String>(0))
            .map_err(storage_error)?;

        let mut messages = Vec::new();
        for row in rows {
            let payload = row.map_err(storage_error)?;
            match serde_json::from_str::<Message>(&payload) {
                Ok(message) => messages.push(message),
                // A corrupt row must never take the whole conversation down.
                Err(error) => {
                    tracing::warn!(chat_key, reason = %error, "skipping unreadable cache row")
                }
            }
        }
        Ok(messages)
    }

    fn upsert_messages(&self, chat_key: &str, messages: &[Message]) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage_error)?;
        for message in messages {
            insert_message(&tx, chat_key, message)?;
        }
        tx.commit().map_err(storage_error)
    }

    fn update_status(
        &self,
        identity: &str,
        status: DeliveryStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT chat_key, payload FROM messages WHERE identity = ?1",
                params![identity],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_error)?;

        // Unknown identities are a no-op: the upsert may simply not have
        // landed, and status writes must stay idempotent.
        let Some((chat_key, payload)) = row else {
            return Ok(());
        };

        let mut message: Message = serde_json::from_str(&payload).map_err(storage_error)?;
        message.status = Some(status);
        message.failure_reason = failure_reason.map(str::to_owned);
        insert_message(&conn, &chat_key, &message)
    }

    fn rename_identity(&self, old: &str, new: &NewIdentifiers) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage_error)?;

        let row: Option<(String, String)> = tx
            .query_row(
                "SELECT chat_key, payload FROM messages WHERE identity = ?1",
                params![old],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_error)?;

        let Some((chat_key, payload)) = row else {
            return tx.commit().map_err(storage_error);
        };

        let mut message: Message = serde_json::from_str(&payload).map_err(storage_error)?;
        message.identity = new.identity.clone();

        tx.execute("DELETE FROM messages WHERE identity = ?1", params![old])
            .map_err(storage_error)?;
        insert_message(&tx, &chat_key, &message)?;
        tx.commit().map_err(storage_error)
    }
}
