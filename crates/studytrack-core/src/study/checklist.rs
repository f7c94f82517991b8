//! Carrying check marks across an edit of a task's item lists.

use super::{ChecklistState, StudyTask};

/// Rebuild the done-flags for `new_items` from an older list.
///
/// Each new item takes the flag of the first old item with identical text;
/// items with no textual match start unchecked.
pub fn reconcile(old_items: &[String], old_done: &[bool], new_items: &[String]) -> Vec<bool> {
    new_items
        .iter()
        .map(|item| {
            old_items
                .iter()
                .position(|old| old == item)
                .and_then(|i| old_done.get(i).copied())
                .unwrap_or(false)
        })
        .collect()
}

impl ChecklistState {
    /// Checklist for `edited`, carrying marks over from `previous`.
    pub fn carried_over(previous: &StudyTask, check: &ChecklistState, edited: &StudyTask) -> Self {
        Self {
            short_notes_done: reconcile(
                &previous.short_notes,
                &check.short_notes_done,
                &edited.short_notes,
            ),
            long_answers_done: reconcile(
                &previous.long_answers,
                &check.long_answers_done,
                &edited.long_answers,
            ),
        }
    }
}
