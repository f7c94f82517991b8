//! Study tasks: chapters with short-note (SN) and long-answer-question (LAQ)
//! checklists.
//!
//! The persisted unit is a [`TaskRecord`], a `task` / `check` pair stored
//! under one opaque key. Field names on the wire keep the layout existing
//! study data already uses (`Subject`, `Chapter`, `SN`, `LAQ`, ...).

pub mod checklist;
pub mod draft;
pub mod export;
pub mod filter;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use checklist::reconcile;
pub use draft::{parse_lines, TaskDraft};
pub use export::{export_csv, export_file_name, export_rows, ExportRow};
pub use filter::{sort_key, PrioritySet, TaskQuery};

/// Task priority. Ordering follows rank: `High < Medium < Low`.
///
/// Stored values that are not a known priority read back as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank, High=0 < Medium=1 < Low=2.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("'{other}' is not one of High, Medium, Low"),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().unwrap_or_default(),
            Raw::Other(_) => Priority::default(),
        })
    }
}

/// Checklist category within a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Short note.
    #[serde(rename = "SN")]
    ShortNote,
    /// Long answer question.
    #[serde(rename = "LAQ")]
    LongAnswer,
}

impl ItemKind {
    pub fn code(self) -> &'static str {
        match self {
            ItemKind::ShortNote => "SN",
            ItemKind::LongAnswer => "LAQ",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ItemKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sn" | "short-note" | "short_note" | "note" => Ok(ItemKind::ShortNote),
            "laq" | "long-answer" | "long_answer" | "question" => Ok(ItemKind::LongAnswer),
            other => Err(ValidationError::InvalidValue {
                field: "kind".into(),
                message: format!("'{other}' is not SN or LAQ"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyTask {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Chapter")]
    pub chapter: String,
    #[serde(rename = "SN", default)]
    pub short_notes: Vec<String>,
    #[serde(rename = "LAQ", default)]
    pub long_answers: Vec<String>,
    #[serde(rename = "Priority", default)]
    pub priority: Priority,
    /// ISO-8601 date string as stored. Use [`StudyTask::deadline_date`].
    #[serde(rename = "Deadline", default)]
    pub deadline: String,
}

impl StudyTask {
    /// Parsed deadline; `None` when absent or unparseable.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        let raw = self.deadline.trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse::<NaiveDate>().ok()
    }

    pub fn items(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::ShortNote => &self.short_notes,
            ItemKind::LongAnswer => &self.long_answers,
        }
    }

    pub fn total_items(&self) -> usize {
        self.short_notes.len() + self.long_answers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChecklistState {
    #[serde(rename = "SN", default)]
    pub short_notes_done: Vec<bool>,
    #[serde(rename = "LAQ", default)]
    pub long_answers_done: Vec<bool>,
}

impl ChecklistState {
    /// All-unchecked state sized for `task`.
    pub fn unchecked(task: &StudyTask) -> Self {
        Self {
            short_notes_done: vec![false; task.short_notes.len()],
            long_answers_done: vec![false; task.long_answers.len()],
        }
    }

    pub fn done(&self, kind: ItemKind) -> &[bool] {
        match kind {
            ItemKind::ShortNote => &self.short_notes_done,
            ItemKind::LongAnswer => &self.long_answers_done,
        }
    }

    fn done_mut(&mut self, kind: ItemKind) -> &mut Vec<bool> {
        match kind {
            ItemKind::ShortNote => &mut self.short_notes_done,
            ItemKind::LongAnswer => &mut self.long_answers_done,
        }
    }
}

/// Derived completion figures for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// Rounded percentage, 0 when there are no items.
    pub percent: u8,
    pub completed: bool,
}

impl Progress {
    pub fn of(task: &StudyTask, check: &ChecklistState) -> Self {
        let sn_done = count_done(check.done(ItemKind::ShortNote), task.short_notes.len());
        let laq_done = count_done(check.done(ItemKind::LongAnswer), task.long_answers.len());
        let total = task.total_items();
        let done = sn_done + laq_done;
        let percent = if total == 0 {
            0
        } else {
            (100.0 * done as f64 / total as f64).round() as u8
        };
        Self {
            done,
            total,
            percent,
            completed: total > 0
                && sn_done == task.short_notes.len()
                && laq_done == task.long_answers.len(),
        }
    }
}

fn count_done(flags: &[bool], len: usize) -> usize {
    flags.iter().take(len).filter(|d| **d).count()
}

/// The persisted unit: a task and its checklist, written together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: StudyTask,
    #[serde(default)]
    pub check: ChecklistState,
}

impl TaskRecord {
    /// Wrap a task with an all-unchecked checklist.
    pub fn new(task: StudyTask) -> Self {
        let check = ChecklistState::unchecked(&task);
        Self { task, check }
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.task, &self.check)
    }

    /// Pad or truncate the checklist so it lines up with the task lists.
    /// Returns `true` if anything had to change.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        for kind in [ItemKind::ShortNote, ItemKind::LongAnswer] {
            let len = self.task.items(kind).len();
            let flags = self.check.done_mut(kind);
            if flags.len() != len {
                flags.resize(len, false);
                changed = true;
            }
        }
        changed
    }

    /// Set one checklist entry. Returns whether the value changed.
    pub fn set_item(&mut self, kind: ItemKind, index: usize, done: bool) -> Result<bool, ValidationError> {
        self.normalize();
        let flags = self.check.done_mut(kind);
        let len = flags.len();
        let slot = flags.get_mut(index).ok_or_else(|| ValidationError::OutOfBounds {
            collection: kind.code().to_string(),
            index,
            len,
        })?;
        let changed = *slot != done;
        *slot = done;
        Ok(changed)
    }
}

/// A record together with its store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub key: String,
    #[serde(flatten)]
    pub record: TaskRecord,
}

impl TaskEntry {
    pub fn new(key: impl Into<String>, record: TaskRecord) -> Self {
        Self {
            key: key.into(),
            record,
        }
    }

    pub fn task(&self) -> &StudyTask {
        &self.record.task
    }

    pub fn progress(&self) -> Progress {
        self.record.progress()
    }
}
