//! SQLite-backed conversation store. Persistent across process restarts.
//!
//! Schema mirrors the logical contract: an autoincrement `messages` log and
//! a `summaries` table keyed by thread. Each call opens its own connection
//! inside `spawn_blocking`; writes additionally hold an async lock so
//! concurrent runs serialize their writes while reads stay concurrent.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use tokio::sync::Mutex;

use super::{ConversationStore, MemoryError, StoredMessage};

fn storage_err(e: impl std::fmt::Display) -> MemoryError {
    MemoryError::Storage(e.to_string())
}

/// SQLite store for messages and summaries.
pub struct SqliteConversationStore {
    db_path: PathBuf,
    write_lock: Mutex<()>,
}

impl SqliteConversationStore {
    /// Opens (or creates) the database and ensures the tables exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(storage_err)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                thread_id TEXT PRIMARY KEY,
                summary TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(storage_err)?;
        Ok(Self {
            db_path,
            write_lock: Mutex::new(()),
        })
    }

    fn open(&self) -> PathBuf {
        self.db_path.clone()
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn add_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        let db_path = self.open();
        let thread_id = thread_id.to_string();
        let role = role.to_string();
        let content = content.to_string();
        let created_at = Utc::now().to_rfc3339();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            conn.execute(
                "INSERT INTO messages (thread_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![thread_id, role, content, created_at],
            )
            .map_err(storage_err)?;
            Ok(())
        })
        .await
        .map_err(storage_err)?
    }

    async fn get_recent(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, MemoryError> {
        let db_path = self.open();
        let thread_id = thread_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let mut stmt = conn
                .prepare(
                    "SELECT role, content, created_at FROM messages \
                     WHERE thread_id = ?1 ORDER BY id DESC LIMIT ?2",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![thread_id, limit as i64], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(storage_err)?;

            let mut messages: Vec<StoredMessage> = Vec::new();
            for row in rows {
                let (role, content, created_at) = row.map_err(storage_err)?;
                messages.push(StoredMessage {
                    role,
                    content,
                    created_at: parse_timestamp(&created_at),
                });
            }
            // Storage order is newest-first; the contract is oldest-first.
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(storage_err)?
    }

    async fn get_summary(&self, thread_id: &str) -> Result<Option<String>, MemoryError> {
        let db_path = self.open();
        let thread_id = thread_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let mut stmt = conn
                .prepare("SELECT summary FROM summaries WHERE thread_id = ?1")
                .map_err(storage_err)?;
            let mut rows = stmt.query(params![thread_id]).map_err(storage_err)?;
            match rows.next().map_err(storage_err)? {
                Some(row) => Ok(Some(row.get::<_, String>(0).map_err(storage_err)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(storage_err)?
    }

    async fn set_summary(&self, thread_id: &str, summary: &str) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        let db_path = self.open();
        let thread_id = thread_id.to_string();
        let summary = summary.to_string();
        let updated_at = Utc::now().to_rfc3339();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            conn.execute(
                "INSERT INTO summaries (thread_id, summary, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(thread_id) DO UPDATE SET \
                 summary = excluded.summary, updated_at = excluded.updated_at",
                params![thread_id, summary, updated_at],
            )
            .map_err(storage_err)?;
            Ok(())
        })
        .await
        .map_err(storage_err)?
    }

    async fn count_messages(&self, thread_id: &str) -> Result<usize, MemoryError> {
        let db_path = self.open();
        let thread_id = thread_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE thread_id = ?1",
                    params![thread_id],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;
            Ok(count as usize)
        })
        .await
        .map_err(storage_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SqliteConversationStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteConversationStore::new(dir.path().join("memory.sqlite")).unwrap();
        (dir, store)
    }

    /// **Scenario**: Round-trip — persisting a turn then reading
    /// get_recent(limit=2) returns the just-persisted user and assistant
    /// messages in chronological order.
    #[tokio::test]
    async fn roundtrip_recent_is_chronological() {
        let (_dir, store) = temp_store();
        store.add_message("t1", "user", "how is the line?").await.unwrap();
        store
            .add_message("t1", "assistant", "throughput is 120/h")
            .await
            .unwrap();

        let recent = store.get_recent("t1", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, "user");
        assert_eq!(recent[0].content, "how is the line?");
        assert_eq!(recent[1].role, "assistant");
        assert_eq!(recent[1].content, "throughput is 120/h");
    }

    /// **Scenario**: Summaries upsert: one row per thread, latest wins.
    #[tokio::test]
    async fn summary_upsert_latest_wins() {
        let (_dir, store) = temp_store();
        store.set_summary("t1", "first").await.unwrap();
        store.set_summary("t1", "second").await.unwrap();
        assert_eq!(store.get_summary("t1").await.unwrap().as_deref(), Some("second"));
        assert!(store.get_summary("t2").await.unwrap().is_none());
    }

    /// **Scenario**: Counts are per-thread.
    #[tokio::test]
    async fn counts_are_per_thread() {
        let (_dir, store) = temp_store();
        store.add_message("a", "user", "1").await.unwrap();
        store.add_message("a", "assistant", "2").await.unwrap();
        store.add_message("b", "user", "3").await.unwrap();
        assert_eq!(store.count_messages("a").await.unwrap(), 2);
        assert_eq!(store.count_messages("b").await.unwrap(), 1);
        assert_eq!(store.count_messages("c").await.unwrap(), 0);
    }

    /// **Scenario**: The store persists across re-opens of the same path.
    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.sqlite");
        {
            let store = SqliteConversationStore::new(&path).unwrap();
            store.add_message("t", "user", "persisted?").await.unwrap();
        }
        let reopened = SqliteConversationStore::new(&path).unwrap();
        let recent = reopened.get_recent("t", 8).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content, "persisted?");
    }
}
