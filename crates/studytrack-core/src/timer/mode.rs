use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Completed work intervals between long breaks.
pub const CYCLES_BEFORE_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Work,
    Break,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::Break, TimerMode::LongBreak];

    /// Accepted minute range for this mode.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            TimerMode::Work => (1, 120),
            TimerMode::Break => (1, 30),
            TimerMode::LongBreak => (1, 60),
        }
    }

    /// Human label, e.g. "Long Break".
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::Break => "Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "work" | "focus" => Ok(TimerMode::Work),
            "break" | "short_break" => Ok(TimerMode::Break),
            "long_break" | "longbreak" => Ok(TimerMode::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown timer mode '{other}'"),
            }),
        }
    }
}

/// Configured minutes per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work_min: u32,
    pub short_break_min: u32,
    pub long_break_min: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_min: 25,
            short_break_min: 5,
            long_break_min: 15,
        }
    }
}

impl Durations {
    /// Build from raw minutes, rejecting anything outside the per-mode bounds.
    pub fn new(work_min: u32, short_break_min: u32, long_break_min: u32) -> Result<Self, ValidationError> {
        let mut d = Self::default();
        d.set(TimerMode::Work, work_min)?;
        d.set(TimerMode::Break, short_break_min)?;
        d.set(TimerMode::LongBreak, long_break_min)?;
        Ok(d)
    }

    pub fn minutes(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_min,
            TimerMode::Break => self.short_break_min,
            TimerMode::LongBreak => self.long_break_min,
        }
    }

    /// Duration of `mode` in milliseconds.
    pub fn ms(&self, mode: TimerMode) -> u64 {
        u64::from(self.minutes(mode)).saturating_mul(60_000)
    }

    pub fn set(&mut self, mode: TimerMode, minutes: u32) -> Result<(), ValidationError> {
        check_minutes(mode, minutes)?;
        match mode {
            TimerMode::Work => self.work_min = minutes,
            TimerMode::Break => self.short_break_min = minutes,
            TimerMode::LongBreak => self.long_break_min = minutes,
        }
        Ok(())
    }
}

/// Reject minutes outside the allowed range for `mode`.
pub fn check_minutes(mode: TimerMode, minutes: u32) -> Result<(), ValidationError> {
    let (min, max) = mode.bounds();
    if (min..=max).contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::DurationOutOfRange {
            mode,
            minutes,
            min,
            max,
        })
    }
}

/// Format milliseconds as `MM:SS`, truncating partial seconds.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
