//! Filter/sort pipeline deriving the displayed task list.
//!
//! A task passes when it belongs to the selected subject, has an allowed
//! priority, contains the search text (chapter, any SN or any LAQ), and its
//! deadline lies inside the requested window. Survivors are ordered by
//! deadline, then priority rank. Tasks without a usable deadline sort last.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Priority, StudyTask, TaskEntry};

/// Allowed priorities. An empty set allows every priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrioritySet(BTreeSet<Priority>);

impl PrioritySet {
    pub fn allows(&self, priority: Priority) -> bool {
        self.0.is_empty() || self.0.contains(&priority)
    }
}

impl FromIterator<Priority> for PrioritySet {
    fn from_iter<I: IntoIterator<Item = Priority>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Subject to show. `None` shows nothing.
    pub subject: Option<String>,
    #[serde(default)]
    pub priorities: PrioritySet,
    /// Case-insensitive search text.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub deadline_from: Option<NaiveDate>,
    #[serde(default)]
    pub deadline_to: Option<NaiveDate>,
}

impl TaskQuery {
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, task: &StudyTask) -> bool {
        self.matches_with(task, self.needle().as_deref())
    }

    fn matches_with(&self, task: &StudyTask, needle: Option<&str>) -> bool {
        match self.subject.as_deref() {
            Some(subject) if task.subject == subject => {}
            _ => return false,
        }

        if !self.priorities.allows(task.priority) {
            return false;
        }

        if let Some(needle) = needle {
            let hit = task.chapter.to_lowercase().contains(needle)
                || task.short_notes.iter().any(|s| s.to_lowercase().contains(needle))
                || task.long_answers.iter().any(|s| s.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }

        if self.deadline_from.is_none() && self.deadline_to.is_none() {
            return true;
        }
        match task.deadline_date() {
            Some(deadline) => {
                self.deadline_from.map_or(true, |from| deadline >= from)
                    && self.deadline_to.map_or(true, |to| deadline <= to)
            }
            None => false,
        }
    }

    /// Matching entries in collection order.
    pub fn filter<'a>(&self, entries: &'a [TaskEntry]) -> Vec<&'a TaskEntry> {
        let needle = self.needle();
        entries
            .iter()
            .filter(|e| self.matches_with(e.task(), needle.as_deref()))
            .collect()
    }

    /// Matching entries, ordered for display.
    pub fn apply<'a>(&self, entries: &'a [TaskEntry]) -> Vec<&'a TaskEntry> {
        let mut visible = self.filter(entries);
        visible.sort_by_key(|e| sort_key(e.task()));
        visible
    }
}

/// Display order key: deadline (missing or unparseable = latest), then
/// priority rank.
pub fn sort_key(task: &StudyTask) -> (NaiveDate, u8) {
    (
        task.deadline_date().unwrap_or(NaiveDate::MAX),
        task.priority.rank(),
    )
}
