use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::study::ItemKind;
use crate::timer::TimerMode;

/// Every state change in the system produces an Event.
/// The host renders them; `SessionFinished` and `ItemChecked` are the two
/// that trigger an audible alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// The countdown reached zero. Emitted once per expiry; the engine has
    /// already moved on to `next_mode` when this is observed.
    SessionFinished {
        mode: TimerMode,
        next_mode: TimerMode,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    ModeAdvanced {
        from: TimerMode,
        to: TimerMode,
        cycles_completed: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    DurationChanged {
        mode: TimerMode,
        minutes: u32,
        /// True when the edited mode was active and its countdown was restarted.
        interrupted: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        running: bool,
        remaining_ms: u64,
        total_ms: u64,
        cycles_completed: u32,
        display: String,
        at: DateTime<Utc>,
    },
    ItemChecked {
        key: String,
        kind: ItemKind,
        index: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether the host should play an alert for this event.
    pub fn is_alert(&self) -> bool {
        matches!(self, Event::SessionFinished { .. } | Event::ItemChecked { .. })
    }
}

/// Convert epoch milliseconds to a UTC timestamp, clamping values chrono
/// cannot represent to the epoch.
pub(crate) fn at_ms(epoch_ms: u64) -> DateTime<Utc> {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
}
