pub mod config;
pub mod export;
pub mod overview;
pub mod subject;
pub mod task;
pub mod timer;

use std::error::Error;
use std::path::PathBuf;

use serde::Serialize;
use studytrack_core::storage::data_dir;
use studytrack_core::{open_store, Config, Event, RecordStore, StudySession};

pub type CmdResult = Result<(), Box<dyn Error>>;

/// A session over whichever backend the config selects.
pub type Session = StudySession<Box<dyn RecordStore>>;

/// Open the configured store and load the session, preferring the subject
/// remembered in `[view]` unless `subject` overrides it.
///
/// A remembered subject that no longer exists falls back to the first one;
/// an explicit `subject` must exist.
pub fn open_session(config: &Config, subject: Option<&str>) -> Result<Session, Box<dyn Error>> {
    let store = open_store(config)?;
    let requested = subject.or(config.view.subject.as_deref());
    let session = StudySession::load(store, requested)?;
    if let Some(name) = subject {
        if session.selected_subject() != Some(name) {
            return Err(format!("unknown subject '{name}'").into());
        }
    }
    Ok(session)
}

/// Accept a full key or a unique prefix of one.
pub fn resolve_key(session: &Session, key: &str) -> Result<String, Box<dyn Error>> {
    if session.get(key).is_some() {
        return Ok(key.to_string());
    }
    let mut hits = session.entries().iter().filter(|e| e.key.starts_with(key));
    match (hits.next(), hits.next()) {
        (Some(entry), None) => Ok(entry.key.clone()),
        (Some(_), Some(_)) => Err(format!("key prefix '{key}' is ambiguous").into()),
        (None, _) => Err(format!("no task with key '{key}'").into()),
    }
}

/// Path of a CLI state file inside the data directory.
pub fn state_file(name: &str) -> Result<PathBuf, std::io::Error> {
    Ok(data_dir()?.join(name))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ring the terminal bell for alert events when notifications allow it.
pub fn alert(config: &Config, event: &Event) {
    if config.notifications.enabled && config.notifications.bell && event.is_alert() {
        eprint!("\x07");
    }
}

/// First eight characters of a key, enough to pass back as a prefix.
pub fn short_key(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}
