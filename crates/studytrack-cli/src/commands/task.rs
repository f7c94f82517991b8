use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use studytrack_core::study::parse_lines;
use studytrack_core::timer::now_ms;
use studytrack_core::{
    user_namespace, Config, ItemKind, Priority, PrioritySet, TaskDraft, TaskEntry, TaskQuery,
};

use super::{alert, open_session, print_json, resolve_key, short_key, state_file, CmdResult, Session};

const UNDO_FILE: &str = "last_deleted.json";

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new chapter task
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        chapter: String,
        /// Short note item (repeatable; multi-line values give one item per line)
        #[arg(long = "sn")]
        short_notes: Vec<String>,
        /// Long answer question (repeatable; multi-line values give one item per line)
        #[arg(long = "laq")]
        long_answers: Vec<String>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// List tasks of the selected subject
    List(ListArgs),
    /// Show one task with its checklist
    Show {
        /// Task key or unique key prefix
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Edit a task; omitted fields keep their value
    Edit {
        /// Task key or unique key prefix
        key: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        chapter: Option<String>,
        /// Replace the short notes (repeatable)
        #[arg(long = "sn")]
        short_notes: Vec<String>,
        /// Replace the long answer questions (repeatable)
        #[arg(long = "laq")]
        long_answers: Vec<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Mark a checklist item done
    Check(ItemArgs),
    /// Mark a checklist item pending
    Uncheck(ItemArgs),
    /// Delete a task (undo with `task undo`)
    Delete {
        /// Task key or unique key prefix
        key: String,
    },
    /// Restore the most recently deleted task
    Undo,
}

#[derive(Args)]
pub struct ListArgs {
    /// Subject to list instead of the selected one
    #[arg(long)]
    pub subject: Option<String>,
    /// Allowed priorities (comma separated); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<Priority>,
    /// Case-insensitive text in chapter or any item
    #[arg(long)]
    pub search: Option<String>,
    /// Earliest deadline (inclusive)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Latest deadline (inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn query(&self, session: &Session) -> TaskQuery {
        TaskQuery {
            priorities: self.priority.iter().copied().collect::<PrioritySet>(),
            search: self.search.clone(),
            deadline_from: self.from,
            deadline_to: self.to,
            ..session.query()
        }
    }
}

#[derive(Args)]
pub struct ItemArgs {
    /// Task key or unique key prefix
    pub key: String,
    /// SN or LAQ
    pub kind: ItemKind,
    /// Item number as shown by `task show` (1-based)
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub number: u32,
}

/// What `task delete` leaves behind for `task undo`.
#[derive(Serialize, Deserialize)]
struct DeletedTask {
    namespace: String,
    entry: TaskEntry,
}

fn split_items(values: Vec<String>) -> Vec<String> {
    values.iter().flat_map(|v| parse_lines(v)).collect()
}

pub fn run(action: TaskAction) -> CmdResult {
    let config = Config::load()?;

    match action {
        TaskAction::Add {
            subject,
            chapter,
            short_notes,
            long_answers,
            priority,
            deadline,
        } => {
            let mut session = open_session(&config, None)?;
            let draft = TaskDraft {
                subject,
                chapter,
                short_notes: split_items(short_notes),
                long_answers: split_items(long_answers),
                priority,
                deadline,
            };
            let key = session.add_task(&draft)?;
            println!("Task added: {key}");
        }
        TaskAction::List(args) => {
            let session = open_session(&config, args.subject.as_deref())?;
            let query = args.query(&session);
            let visible = session.visible(&query);
            if args.json {
                return print_json(&visible);
            }
            match session.selected_subject() {
                None => println!("No tasks yet. Add one with `studytrack task add`."),
                Some(subject) => {
                    println!("{subject}");
                    if visible.is_empty() {
                        println!("  (no tasks match)");
                    }
                    for entry in visible {
                        print_line(entry);
                    }
                }
            }
        }
        TaskAction::Show { key, json } => {
            let session = open_session(&config, None)?;
            let key = resolve_key(&session, &key)?;
            let Some(entry) = session.get(&key) else {
                return Err(format!("no task with key '{key}'").into());
            };
            if json {
                return print_json(entry);
            }
            print_details(entry);
        }
        TaskAction::Edit {
            key,
            subject,
            chapter,
            short_notes,
            long_answers,
            priority,
            deadline,
            clear_deadline,
        } => {
            let mut session = open_session(&config, None)?;
            let key = resolve_key(&session, &key)?;
            let Some(entry) = session.get(&key) else {
                return Err(format!("no task with key '{key}'").into());
            };
            let mut draft = TaskDraft::from_task(entry.task());
            if let Some(subject) = subject {
                draft.subject = subject;
            }
            if let Some(chapter) = chapter {
                draft.chapter = chapter;
            }
            if !short_notes.is_empty() {
                draft.short_notes = split_items(short_notes);
            }
            if !long_answers.is_empty() {
                draft.long_answers = split_items(long_answers);
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if deadline.is_some() {
                draft.deadline = deadline;
            }
            if clear_deadline {
                draft.deadline = None;
            }
            let entry = session.edit_task(&key, &draft)?;
            println!("Task updated: {}", entry.key);
        }
        TaskAction::Check(item) => set_item(&config, item, true)?,
        TaskAction::Uncheck(item) => set_item(&config, item, false)?,
        TaskAction::Delete { key } => {
            let mut session = open_session(&config, None)?;
            let key = resolve_key(&session, &key)?;
            let removed = session.delete_task(&key)?;
            let deleted = DeletedTask {
                namespace: user_namespace(&config.storage.user),
                entry: removed,
            };
            std::fs::write(state_file(UNDO_FILE)?, serde_json::to_string(&deleted)?)?;
            println!(
                "Task deleted: {} ({}). Run `studytrack task undo` to restore it.",
                deleted.entry.task().chapter,
                short_key(&deleted.entry.key)
            );
        }
        TaskAction::Undo => {
            let path = state_file(UNDO_FILE)?;
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    println!("Nothing to undo.");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let deleted: DeletedTask = serde_json::from_str(&content)?;
            if deleted.namespace != user_namespace(&config.storage.user) {
                return Err(format!(
                    "the last deletion belongs to {}; switch storage.user back to undo it",
                    deleted.namespace
                )
                .into());
            }
            let mut session = open_session(&config, None)?;
            let key = session.restore(deleted.entry)?;
            std::fs::remove_file(&path)?;
            println!("Task restored: {key}");
        }
    }
    Ok(())
}

fn set_item(config: &Config, item: ItemArgs, done: bool) -> CmdResult {
    let mut session = open_session(config, None)?;
    let key = resolve_key(&session, &item.key)?;
    let index = item.number as usize - 1;
    if let Some(event) = session.set_item(&key, item.kind, index, done, now_ms())? {
        alert(config, &event);
    }
    if let Some(entry) = session.get(&key) {
        let progress = entry.progress();
        println!(
            "{} {} #{}: {} ({}/{} done, {}%)",
            entry.task().chapter,
            item.kind,
            item.number,
            if done { "done" } else { "pending" },
            progress.done,
            progress.total,
            progress.percent
        );
    }
    Ok(())
}

fn deadline_label(entry: &TaskEntry) -> String {
    match entry.task().deadline_date() {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "-".into(),
    }
}

fn print_line(entry: &TaskEntry) {
    let progress = entry.progress();
    let mark = if progress.completed { "x" } else { " " };
    println!(
        "  [{mark}] {}  {:<24} {:<6} due {:<10}  {}/{} ({}%)",
        short_key(&entry.key),
        entry.task().chapter,
        entry.task().priority,
        deadline_label(entry),
        progress.done,
        progress.total,
        progress.percent
    );
}

fn print_details(entry: &TaskEntry) {
    let task = entry.task();
    let progress = entry.progress();
    println!("{} / {}", task.subject, task.chapter);
    println!("  key:      {}", entry.key);
    println!("  priority: {}", task.priority);
    println!("  deadline: {}", deadline_label(entry));
    println!("  progress: {}/{} ({}%)", progress.done, progress.total, progress.percent);
    for kind in [ItemKind::ShortNote, ItemKind::LongAnswer] {
        let items = task.items(kind);
        if items.is_empty() {
            continue;
        }
        println!("  {kind}:");
        let done = entry.record.check.done(kind);
        for (i, text) in items.iter().enumerate() {
            let mark = if done.get(i).copied().unwrap_or(false) { "x" } else { " " };
            println!("    {:>2}. [{mark}] {text}", i + 1);
        }
    }
}
