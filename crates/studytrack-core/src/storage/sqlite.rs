//! SQLite-backed record store.
//!
//! One table keyed by `(namespace, key)`; the value column holds the JSON
//! `{task, check}` record so the layout matches the remote store exactly.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

use super::{data_dir, decode_record, RecordStore};
use crate::error::{CoreError, StoreError};
use crate::study::{TaskEntry, TaskRecord};

pub struct SqliteStore {
    conn: Connection,
    namespace: String,
}

impl SqliteStore {
    /// Open the database at `~/.config/studytrack/studytrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open(namespace: &str) -> Result<Self, CoreError> {
        let path = data_dir()?.join("studytrack.db");
        Ok(Self::open_at(&path, namespace)?)
    }

    pub fn open_at(path: &Path, namespace: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, namespace)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory(namespace: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self, StoreError> {
        let store = Self {
            conn,
            namespace: namespace.to_string(),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                namespace   TEXT NOT NULL,
                key         TEXT NOT NULL,
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );",
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn load_all(&self) -> Result<Vec<TaskEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM records WHERE namespace = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![self.namespace], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
            if let Some(entry) = decode_record(&key, value) {
                entries.push(entry);
            }
        }
        debug!(namespace = %self.namespace, count = entries.len(), "loaded records");
        Ok(entries)
    }

    fn put(&self, key: &str, record: &TaskRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO records (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.namespace, key, value, Utc::now().to_rfc3339()],
        )?;
        debug!(namespace = %self.namespace, key, "record written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM records WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
        )?;
        debug!(namespace = %self.namespace, key, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::{Priority, StudyTask};

    fn record(chapter: &str) -> TaskRecord {
        TaskRecord::new(StudyTask {
            subject: "Anatomy".into(),
            chapter: chapter.into(),
            short_notes: vec!["Pleura".into()],
            long_answers: vec![],
            priority: Priority::Medium,
            deadline: "2024-03-01".into(),
        })
    }

    #[test]
    fn put_load_delete() {
        let store = SqliteStore::open_memory("users/a/tasks").unwrap();
        store.put("k1", &record("Thorax")).unwrap();
        store.put("k2", &record("Abdomen")).unwrap();

        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "k1");
        assert_eq!(entries[1].task().chapter, "Abdomen");

        store.delete("k1").unwrap();
        store.delete("missing").unwrap();
        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "k2");
    }

    #[test]
    fn overwrite_keeps_position() {
        let store = SqliteStore::open_memory("users/a/tasks").unwrap();
        store.put("k1", &record("Thorax")).unwrap();
        store.put("k2", &record("Abdomen")).unwrap();
        store.put("k1", &record("Thorax II")).unwrap();

        let entries = store.load_all().unwrap();
        assert_eq!(entries[0].key, "k1");
        assert_eq!(entries[0].task().chapter, "Thorax II");
    }

    #[test]
    fn namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studytrack.db");
        let alice = SqliteStore::open_at(&path, "users/alice/tasks").unwrap();
        let bob = SqliteStore::open_at(&path, "users/bob/tasks").unwrap();

        alice.put("k", &record("Thorax")).unwrap();
        assert!(bob.load_all().unwrap().is_empty());
        bob.delete("k").unwrap();
        assert_eq!(alice.load_all().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_rows_are_skipped() {
        let store = SqliteStore::open_memory("ns").unwrap();
        store.put("good", &record("Thorax")).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO records (namespace, key, value, updated_at) VALUES ('ns', 'bad', '{not json', '')",
                [],
            )
            .unwrap();
        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "good");
    }
}
