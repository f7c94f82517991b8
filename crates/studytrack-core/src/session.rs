//! Per-session state and the user actions that mutate it.
//!
//! A [`StudySession`] owns the loaded task collection, the derived subject
//! list, the selected subject and the last deleted entry. Each action writes
//! through to the [`RecordStore`] first and only touches in-memory state once
//! the write succeeded, so a failed write leaves the session as it was.

use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, ValidationError};
use crate::events::{at_ms, Event};
use crate::storage::RecordStore;
use crate::study::{
    export_csv, ChecklistState, ItemKind, Progress, TaskDraft, TaskEntry, TaskQuery, TaskRecord,
};

/// One line of the completion overview.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OverviewLine {
    pub key: String,
    pub chapter: String,
    #[serde(flatten)]
    pub progress: Progress,
}

pub struct StudySession<S: RecordStore> {
    store: S,
    entries: Vec<TaskEntry>,
    selected_subject: Option<String>,
    last_deleted: Option<TaskEntry>,
}

impl<S: RecordStore> StudySession<S> {
    /// Load every record from `store` and pick the subject to show:
    /// `requested` when it exists, otherwise the first subject in order.
    pub fn load(store: S, requested: Option<&str>) -> Result<Self, CoreError> {
        let entries = store.load_all()?;
        let mut session = Self {
            store,
            entries,
            selected_subject: None,
            last_deleted: None,
        };
        session.select_subject(requested);
        info!(tasks = session.entries.len(), subject = ?session.selected_subject, "session loaded");
        Ok(session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Distinct subjects, sorted.
    pub fn subjects(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.task().subject.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn selected_subject(&self) -> Option<&str> {
        self.selected_subject.as_deref()
    }

    /// Select `requested` if it is a known subject, else fall back to the
    /// first subject (or none when there are no tasks). Returns the
    /// effective selection.
    pub fn select_subject(&mut self, requested: Option<&str>) -> Option<&str> {
        let subjects = self.subjects();
        self.selected_subject = match requested {
            Some(r) if subjects.iter().any(|s| s == r) => Some(r.to_string()),
            _ => subjects.into_iter().next(),
        };
        self.selected_subject.as_deref()
    }

    /// Query preset to the selected subject.
    pub fn query(&self) -> TaskQuery {
        TaskQuery {
            subject: self.selected_subject.clone(),
            ..TaskQuery::default()
        }
    }

    /// Filtered and ordered entries for display.
    pub fn visible(&self, query: &TaskQuery) -> Vec<&TaskEntry> {
        query.apply(&self.entries)
    }

    /// Completion figures for the filtered tasks, in collection order.
    pub fn overview(&self, query: &TaskQuery) -> Vec<OverviewLine> {
        query
            .filter(&self.entries)
            .into_iter()
            .map(|e| OverviewLine {
                key: e.key.clone(),
                chapter: e.task().chapter.clone(),
                progress: e.progress(),
            })
            .collect()
    }

    /// Create a task from `draft`. Returns the new key.
    pub fn add_task(&mut self, draft: &TaskDraft) -> Result<String, CoreError> {
        let task = draft.validate()?;
        let record = TaskRecord::new(task);
        let key = Uuid::new_v4().to_string();
        self.store.put(&key, &record)?;

        info!(key = %key, chapter = %record.task.chapter, "task added");
        let subject = record.task.subject.clone();
        self.entries.push(TaskEntry::new(key.clone(), record));
        if self.selected_subject.is_none() {
            self.selected_subject = Some(subject);
        }
        Ok(key)
    }

    /// Replace the task under `key`, carrying check marks over by item text.
    pub fn edit_task(&mut self, key: &str, draft: &TaskDraft) -> Result<&TaskEntry, CoreError> {
        let task = draft.validate()?;
        let idx = self.index_of(key)?;
        let current = &self.entries[idx].record;
        let check = ChecklistState::carried_over(&current.task, &current.check, &task);
        let record = TaskRecord { task, check };
        self.store.put(key, &record)?;

        info!(key, chapter = %record.task.chapter, "task updated");
        self.entries[idx].record = record;
        // The edit may have moved the last task out of the selected subject.
        let requested = self.selected_subject.clone();
        self.select_subject(requested.as_deref());
        Ok(&self.entries[idx])
    }

    /// Mark one checklist item done or pending.
    ///
    /// Checking an item yields `Event::ItemChecked`; unchecking, or setting
    /// an item to the value it already has, yields nothing.
    pub fn set_item(
        &mut self,
        key: &str,
        kind: ItemKind,
        index: usize,
        done: bool,
        now_ms: u64,
    ) -> Result<Option<Event>, CoreError> {
        let idx = self.index_of(key)?;
        let mut record = self.entries[idx].record.clone();
        if !record.set_item(kind, index, done)? {
            return Ok(None);
        }
        self.store.put(key, &record)?;
        self.entries[idx].record = record;

        Ok(done.then(|| Event::ItemChecked {
            key: key.to_string(),
            kind,
            index,
            at: at_ms(now_ms),
        }))
    }

    /// Delete the task under `key`, remembering it for [`Self::undo_delete`].
    pub fn delete_task(&mut self, key: &str) -> Result<TaskEntry, CoreError> {
        let idx = self.index_of(key)?;
        self.store.delete(key)?;

        let removed = self.entries.remove(idx);
        info!(key, chapter = %removed.task().chapter, "task deleted");
        self.last_deleted = Some(removed.clone());
        let requested = self.selected_subject.clone();
        self.select_subject(requested.as_deref());
        Ok(removed)
    }

    pub fn last_deleted(&self) -> Option<&TaskEntry> {
        self.last_deleted.as_ref()
    }

    /// Restore the most recently deleted task. `Ok(None)` when there is
    /// nothing to undo.
    pub fn undo_delete(&mut self) -> Result<Option<String>, CoreError> {
        let Some(entry) = self.last_deleted.clone() else {
            return Ok(None);
        };
        let key = self.restore(entry)?;
        self.last_deleted = None;
        Ok(Some(key))
    }

    /// Write `entry` back under its original key.
    pub fn restore(&mut self, entry: TaskEntry) -> Result<String, CoreError> {
        self.store.put(&entry.key, &entry.record)?;
        info!(key = %entry.key, "task restored");
        let key = entry.key.clone();
        match self.entries.iter().position(|e| e.key == key) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
        if self.selected_subject.is_none() {
            self.select_subject(None);
        }
        Ok(key)
    }

    /// CSV export of the selected subject. `None` when nothing to export.
    pub fn export_csv(&self) -> Option<String> {
        let subject = self.selected_subject.as_deref()?;
        export_csv(&self.entries, subject)
    }

    fn index_of(&self, key: &str) -> Result<usize, ValidationError> {
        self.entries
            .iter()
            .position(|e| e.key == key)
            .ok_or_else(|| ValidationError::UnknownTask(key.to_string()))
    }
}
