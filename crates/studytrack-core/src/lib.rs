//! # StudyTrack Core Library
//!
//! Business logic for the StudyTrack study planner: chapters with short-note
//! and long-answer checklists, completion tracking, filtering, export, and a
//! Pomodoro focus timer. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine; the caller supplies
//!   the current time and drives `tick()` (see [`Ticker`])
//! - **Study model**: [`TaskRecord`] = task + checklist, stored as one unit
//! - **Filter pipeline**: [`TaskQuery`] selects and orders what is shown
//! - **Storage**: [`RecordStore`] backends (SQLite, remote REST) under a
//!   per-user namespace, plus TOML [`Config`]
//! - **Session**: [`StudySession`] holds all per-session state explicitly
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`StudySession`]: Task lifecycle (add, edit, check, delete, undo)
//! - [`TaskQuery`]: Subject / priority / search / deadline filtering
//! - [`RecordStore`]: Persistence trait

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod study;
pub mod timer;

pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use session::{OverviewLine, StudySession};
pub use storage::{open_store, user_namespace, Config, RecordStore, RemoteStore, SqliteStore};
pub use study::{
    ChecklistState, ItemKind, Priority, PrioritySet, Progress, StudyTask, TaskDraft, TaskEntry,
    TaskQuery, TaskRecord,
};
pub use timer::{Durations, TickOutcome, Ticker, TimerEngine, TimerMode};
