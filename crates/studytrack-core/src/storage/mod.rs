mod config;
pub mod remote;
pub mod sqlite;

pub use config::{Config, NotificationsConfig, StorageBackend, StorageConfig, TimerConfig, ViewConfig};
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use tracing::warn;

use crate::error::{ConfigError, CoreError, StoreError};
use crate::study::{TaskEntry, TaskRecord};

/// Hierarchical key-value persistence for task records.
///
/// Every store is bound to one user namespace; keys are opaque and a record
/// is always written and read as one unit.
pub trait RecordStore {
    /// All records in the namespace.
    fn load_all(&self) -> Result<Vec<TaskEntry>, StoreError>;

    /// Create or overwrite the record under `key`.
    fn put(&self, key: &str, record: &TaskRecord) -> Result<(), StoreError>;

    /// Remove the record under `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn load_all(&self) -> Result<Vec<TaskEntry>, StoreError> {
        (**self).load_all()
    }

    fn put(&self, key: &str, record: &TaskRecord) -> Result<(), StoreError> {
        (**self).put(key, record)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

/// Namespace holding one user's tasks, e.g. `users/alice/tasks`.
///
/// Characters that are not allowed in hierarchical database keys are
/// replaced with `_`.
pub fn user_namespace(user: &str) -> String {
    let cleaned: String = user
        .trim()
        .chars()
        .map(|c| if matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_control() { '_' } else { c })
        .collect();
    let user = if cleaned.is_empty() { "default" } else { cleaned.as_str() };
    format!("users/{user}/tasks")
}

/// Decode one stored value, fixing up checklist lengths.
/// Returns `None` (and logs) for records that cannot be decoded.
pub(crate) fn decode_record(key: &str, value: serde_json::Value) -> Option<TaskEntry> {
    match serde_json::from_value::<TaskRecord>(value) {
        Ok(mut record) => {
            if record.normalize() {
                warn!(key, "checklist length did not match task items; normalised");
            }
            Some(TaskEntry::new(key, record))
        }
        Err(e) => {
            warn!(key, error = %e, "skipping undecodable record");
            None
        }
    }
}

/// Returns `~/.config/studytrack[-dev]/` based on STUDYTRACK_ENV, or
/// STUDYTRACK_HOME when set.
///
/// Set STUDYTRACK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("STUDYTRACK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYTRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studytrack-dev")
            } else {
                base_dir.join("studytrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Open the backend selected in `config`, bound to the configured user.
pub fn open_store(config: &Config) -> Result<Box<dyn RecordStore>, CoreError> {
    let namespace = user_namespace(&config.storage.user);
    match config.storage.backend {
        StorageBackend::Sqlite => Ok(Box::new(SqliteStore::open(&namespace)?)),
        StorageBackend::Remote => {
            let url = config
                .storage
                .remote_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "storage.remote_url".into(),
                    message: "required when storage.backend = \"remote\"".into(),
                })?;
            Ok(Box::new(RemoteStore::new(
                url,
                &namespace,
                config.storage.auth_token.clone(),
            )?))
        }
    }
}
