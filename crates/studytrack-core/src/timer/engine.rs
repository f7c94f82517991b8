//! Pomodoro timer engine.
//!
//! The engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller passes the current time (epoch
//! milliseconds) into every command and is responsible for calling
//! `tick()` periodically while the timer is running (see [`super::Ticker`]).
//!
//! ## Mode cycle
//!
//! ```text
//! Work -> Break -> Work -> Break -> Work -> Break -> Work -> LongBreak -> Work ...
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start(now_ms());
//! // In a loop:
//! engine.tick(now_ms()); // Returns Some(Event::SessionFinished) on expiry
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::mode::{format_clock, Durations, TimerMode, CYCLES_BEFORE_LONG_BREAK};
use crate::error::ValidationError;
use crate::events::{at_ms, Event};

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    durations: Durations,
    mode: TimerMode,
    /// Remaining time in milliseconds for the current mode.
    remaining_ms: u64,
    running: bool,
    cycles_completed: u32,
    /// Timestamp (ms since epoch) of the last start/tick/advance.
    last_tick_epoch_ms: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

impl TimerEngine {
    /// Create a new engine in `Work` mode with the full work duration.
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            mode: TimerMode::Work,
            remaining_ms: durations.ms(TimerMode::Work),
            running: false,
            cycles_completed: 0,
            last_tick_epoch_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    /// Full length of the current mode.
    pub fn total_ms(&self) -> u64 {
        self.durations.ms(self.mode)
    }

    /// 0.0 .. 1.0 progress within the current mode.
    pub fn progress(&self) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining_ms)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            running: self.running,
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms(),
            cycles_completed: self.cycles_completed,
            display: self.display(),
            at: at_ms(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        self.last_tick_epoch_ms = now_ms;
        debug!(mode = %self.mode, remaining_ms = self.remaining_ms, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_ms: self.remaining_ms,
            at: at_ms(now_ms),
        })
    }

    /// Stop the countdown, keeping the time elapsed since the last tick.
    ///
    /// If that elapsed time already covers the remainder, the session
    /// finishes instead and `SessionFinished` is returned.
    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if !self.running {
            return None;
        }
        if let Some(finished) = self.tick(now_ms) {
            return Some(finished);
        }
        self.running = false;
        debug!(remaining_ms = self.remaining_ms, "timer paused");
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: at_ms(now_ms),
        })
    }

    /// Back to a fresh `Work` interval using the current durations.
    pub fn reset(&mut self, now_ms: u64) -> Event {
        self.running = false;
        self.mode = TimerMode::Work;
        self.remaining_ms = self.durations.ms(TimerMode::Work);
        self.cycles_completed = 0;
        self.last_tick_epoch_ms = now_ms;
        debug!("timer reset");
        Event::TimerReset { at: at_ms(now_ms) }
    }

    /// Call periodically while running. Returns `Some(Event::SessionFinished)`
    /// exactly once per expiry; the engine has advanced to the next mode and
    /// stopped by then, so later ticks are no-ops until the next `start`.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if !self.running {
            return None;
        }
        let elapsed = now_ms.saturating_sub(self.last_tick_epoch_ms);
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
        self.last_tick_epoch_ms = now_ms;

        if self.remaining_ms > 0 {
            return None;
        }

        let finished = self.mode;
        self.running = false;
        self.advance_mode(now_ms);
        debug!(mode = %finished, next = %self.mode, cycles = self.cycles_completed, "session finished");
        Some(Event::SessionFinished {
            mode: finished,
            next_mode: self.mode,
            cycles_completed: self.cycles_completed,
            at: at_ms(now_ms),
        })
    }

    /// Move to the next mode in the cycle without waiting for expiry.
    pub fn skip(&mut self, now_ms: u64) -> Event {
        let from = self.mode;
        self.advance_mode(now_ms);
        Event::ModeAdvanced {
            from,
            to: self.mode,
            cycles_completed: self.cycles_completed,
            duration_secs: self.remaining_ms / 1000,
            at: at_ms(now_ms),
        }
    }

    /// Change the configured minutes for `mode`.
    ///
    /// Editing the active mode restarts its countdown from the new value and
    /// stops the timer; editing another mode leaves the countdown alone.
    pub fn configure_duration(
        &mut self,
        mode: TimerMode,
        minutes: u32,
        now_ms: u64,
    ) -> Result<Event, ValidationError> {
        self.durations.set(mode, minutes)?;
        let interrupted = mode == self.mode;
        if interrupted {
            self.remaining_ms = self.durations.ms(mode);
            self.running = false;
            self.last_tick_epoch_ms = now_ms;
        }
        Ok(Event::DurationChanged {
            mode,
            minutes,
            interrupted,
            at: at_ms(now_ms),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance_mode(&mut self, now_ms: u64) {
        self.mode = match self.mode {
            TimerMode::Work => {
                self.cycles_completed += 1;
                if self.cycles_completed % CYCLES_BEFORE_LONG_BREAK == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::Break
                }
            }
            TimerMode::Break | TimerMode::LongBreak => TimerMode::Work,
        };
        self.remaining_ms = self.durations.ms(self.mode);
        self.running = false;
        self.last_tick_epoch_ms = now_ms;
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn running_engine() -> TimerEngine {
        let mut engine = TimerEngine::default();
        engine.start(T0);
        engine
    }

    #[test]
    fn new_engine_is_idle_work() {
        let engine = TimerEngine::default();
        assert_eq!(engine.mode(), TimerMode::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.cycles_completed(), 0);
        assert_eq!(engine.remaining_ms(), 25 * 60 * 1000);
        assert_eq!(engine.display(), "25:00");
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = TimerEngine::default();
        assert!(engine.start(T0).is_some());
        assert!(engine.start(T0 + 5_000).is_none());
        // The second start must not move last_tick forward.
        engine.tick(T0 + 10_000);
        assert_eq!(engine.remaining_ms(), 25 * 60 * 1000 - 10_000);
    }

    #[test]
    fn tick_subtracts_elapsed() {
        let mut engine = running_engine();
        assert!(engine.tick(T0 + 1_500).is_none());
        assert_eq!(engine.remaining_ms(), 25 * 60 * 1000 - 1_500);
        assert_eq!(engine.mode(), TimerMode::Work);
        assert!(engine.is_running());
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut engine = running_engine();
        assert_eq!(engine.progress(), 0.0);
        engine.tick(T0 + 25 * 60 * 1000 / 4);
        assert!((engine.progress() - 0.25).abs() < 1e-9);
        engine.pause(T0 + 25 * 60 * 1000 / 2);
        assert!((engine.progress() - 0.5).abs() < 1e-9);
        engine.skip(T0 + 25 * 60 * 1000 / 2);
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn tick_while_stopped_is_noop() {
        let mut engine = TimerEngine::default();
        assert!(engine.tick(T0 + 60_000).is_none());
        assert_eq!(engine.remaining_ms(), 25 * 60 * 1000);
    }

    #[test]
    fn expiry_finishes_once_and_advances() {
        let mut engine = running_engine();
        let event = engine.tick(T0 + 25 * 60 * 1000 + 42).expect("finished");
        match event {
            Event::SessionFinished {
                mode,
                next_mode,
                cycles_completed,
                ..
            } => {
                assert_eq!(mode, TimerMode::Work);
                assert_eq!(next_mode, TimerMode::Break);
                assert_eq!(cycles_completed, 1);
            }
            other => panic!("Expected SessionFinished, got {other:?}"),
        }
        assert!(!engine.is_running());
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.remaining_ms(), 5 * 60 * 1000);
        assert!(engine.tick(T0 + 30 * 60 * 1000).is_none());
    }

    #[test]
    fn fourth_work_interval_leads_to_long_break() {
        let mut engine = TimerEngine::default();
        for expected in [TimerMode::Break, TimerMode::Work, TimerMode::Break, TimerMode::Work, TimerMode::Break, TimerMode::Work] {
            engine.skip(T0);
            assert_eq!(engine.mode(), expected);
        }
        assert_eq!(engine.cycles_completed(), 3);
        engine.skip(T0);
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        assert_eq!(engine.cycles_completed(), 4);
        assert_eq!(engine.remaining_ms(), 15 * 60 * 1000);
        engine.skip(T0);
        assert_eq!(engine.mode(), TimerMode::Work);
    }

    #[test]
    fn pause_keeps_elapsed_time() {
        let mut engine = running_engine();
        match engine.pause(T0 + 2_000) {
            Some(Event::TimerPaused { remaining_ms, .. }) => {
                assert_eq!(remaining_ms, 25 * 60 * 1000 - 2_000)
            }
            other => panic!("Expected TimerPaused, got {other:?}"),
        }
        assert!(!engine.is_running());
        assert!(engine.pause(T0 + 3_000).is_none());
    }

    #[test]
    fn pause_after_expiry_reports_finish() {
        let mut engine = running_engine();
        let event = engine.pause(T0 + 26 * 60 * 1000);
        assert!(matches!(event, Some(Event::SessionFinished { .. })));
        assert_eq!(engine.mode(), TimerMode::Break);
    }

    #[test]
    fn reset_uses_configured_durations() {
        let mut engine = TimerEngine::default();
        engine.configure_duration(TimerMode::Work, 50, T0).unwrap();
        engine.skip(T0);
        engine.start(T0);
        engine.reset(T0 + 1_000);
        assert_eq!(engine.mode(), TimerMode::Work);
        assert_eq!(engine.remaining_ms(), 50 * 60 * 1000);
        assert_eq!(engine.cycles_completed(), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn configure_active_mode_interrupts() {
        let mut engine = running_engine();
        engine.tick(T0 + 60_000);
        let event = engine.configure_duration(TimerMode::Work, 40, T0 + 61_000).unwrap();
        assert!(matches!(event, Event::DurationChanged { interrupted: true, .. }));
        assert_eq!(engine.remaining_ms(), 40 * 60 * 1000);
        assert!(!engine.is_running());
    }

    #[test]
    fn configure_other_mode_leaves_countdown() {
        let mut engine = running_engine();
        engine.tick(T0 + 60_000);
        let before = engine.remaining_ms();
        let event = engine.configure_duration(TimerMode::LongBreak, 30, T0 + 61_000).unwrap();
        assert!(matches!(event, Event::DurationChanged { interrupted: false, .. }));
        assert_eq!(engine.remaining_ms(), before);
        assert!(engine.is_running());
        assert_eq!(engine.durations().long_break_min, 30);
    }

    #[test]
    fn configure_rejects_out_of_range() {
        let mut engine = TimerEngine::default();
        let err = engine.configure_duration(TimerMode::Break, 45, T0).unwrap_err();
        assert!(matches!(err, ValidationError::DurationOutOfRange { max: 30, .. }));
        assert_eq!(engine.durations().short_break_min, 5);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::default();
        match engine.snapshot(T0) {
            Event::StateSnapshot {
                mode,
                running,
                remaining_ms,
                display,
                ..
            } => {
                assert_eq!(mode, TimerMode::Work);
                assert!(!running);
                assert_eq!(remaining_ms, 25 * 60 * 1000);
                assert_eq!(display, "25:00");
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
