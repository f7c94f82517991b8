//! Flat row-per-checklist-item export for spreadsheets.

use serde::Serialize;

use super::{ItemKind, TaskEntry};

pub const EXPORT_HEADER: [&str; 7] = [
    "Subject", "Chapter", "Type", "Task", "Priority", "Deadline", "Status",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub subject: String,
    pub chapter: String,
    pub kind: ItemKind,
    pub text: String,
    pub priority: String,
    pub deadline: String,
    pub done: bool,
}

impl ExportRow {
    fn fields(&self) -> [&str; 7] {
        [
            &self.subject,
            &self.chapter,
            self.kind.code(),
            &self.text,
            &self.priority,
            &self.deadline,
            if self.done { "Done" } else { "Pending" },
        ]
    }
}

/// One row per SN/LAQ item of every task in `subject`, in collection order.
pub fn export_rows(entries: &[TaskEntry], subject: &str) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for entry in entries.iter().filter(|e| e.task().subject == subject) {
        let task = entry.task();
        for kind in [ItemKind::ShortNote, ItemKind::LongAnswer] {
            let done = entry.record.check.done(kind);
            for (i, text) in task.items(kind).iter().enumerate() {
                rows.push(ExportRow {
                    subject: task.subject.clone(),
                    chapter: task.chapter.clone(),
                    kind,
                    text: text.clone(),
                    priority: task.priority.to_string(),
                    deadline: task.deadline.clone(),
                    done: done.get(i).copied().unwrap_or(false),
                });
            }
        }
    }
    rows
}

/// Comma-separated export with a header row. `None` when there is nothing
/// to export for `subject`.
pub fn export_csv(entries: &[TaskEntry], subject: &str) -> Option<String> {
    let rows = export_rows(entries, subject);
    if rows.is_empty() {
        return None;
    }
    let mut out = String::new();
    write_line(&mut out, &EXPORT_HEADER);
    for row in &rows {
        write_line(&mut out, &row.fields());
    }
    Some(out)
}

/// Suggested download name, e.g. `Anatomy_tasks.csv`.
pub fn export_file_name(subject: &str) -> String {
    let safe: String = subject
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!("{safe}_tasks.csv")
}

fn write_line(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
