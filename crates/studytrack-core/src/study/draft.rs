//! Unvalidated task input as it arrives from a form or the command line.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Priority, StudyTask};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub subject: String,
    pub chapter: String,
    pub short_notes: Vec<String>,
    pub long_answers: Vec<String>,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
}

impl TaskDraft {
    /// Pre-fill a draft from a stored task, e.g. for editing.
    pub fn from_task(task: &StudyTask) -> Self {
        Self {
            subject: task.subject.clone(),
            chapter: task.chapter.clone(),
            short_notes: task.short_notes.clone(),
            long_answers: task.long_answers.clone(),
            priority: task.priority,
            deadline: task.deadline_date(),
        }
    }

    /// Trim everything, drop blank checklist items and enforce the task
    /// invariants.
    pub fn validate(&self) -> Result<StudyTask, ValidationError> {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        let chapter = self.chapter.trim();
        if chapter.is_empty() {
            return Err(ValidationError::EmptyChapter);
        }
        let short_notes = clean_items(&self.short_notes);
        let long_answers = clean_items(&self.long_answers);
        if short_notes.is_empty() && long_answers.is_empty() {
            return Err(ValidationError::NoChecklistItems);
        }

        Ok(StudyTask {
            subject: subject.to_string(),
            chapter: chapter.to_string(),
            short_notes,
            long_answers,
            priority: self.priority,
            deadline: self
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        })
    }
}

/// Split free text into one item per non-blank line.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_items(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
