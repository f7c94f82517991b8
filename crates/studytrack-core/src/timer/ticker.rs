//! Interval driver for [`TimerEngine`].
//!
//! The engine never advances on its own. `Ticker::run` calls `tick()` once
//! per period while the engine is running and returns as soon as it stops,
//! or when the cancel signal flips to `true` (the engine is paused first).

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::engine::{now_ms, TimerEngine};
use crate::events::Event;

/// Source of "now" in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        now_ms()
    }
}

/// Why [`Ticker::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown expired; the engine already moved to the next mode.
    Finished,
    /// Cancelled from outside; the engine was paused.
    Cancelled,
    /// The engine was not running to begin with.
    Idle,
}

#[derive(Debug, Clone)]
pub struct Ticker<C: Clock = SystemClock> {
    period: Duration,
    clock: C,
}

impl Default for Ticker<SystemClock> {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), SystemClock)
    }
}

impl<C: Clock> Ticker<C> {
    pub fn new(period: Duration, clock: C) -> Self {
        Self { period, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Drive `engine` until it stops running or `cancel` becomes `true`.
    ///
    /// `on_event` receives a `StateSnapshot` on every period and any event
    /// the engine produced (including the single `SessionFinished`).
    pub async fn run<F>(
        &self,
        engine: &mut TimerEngine,
        mut cancel: watch::Receiver<bool>,
        mut on_event: F,
    ) -> TickOutcome
    where
        F: FnMut(&Event),
    {
        if !engine.is_running() {
            return TickOutcome::Idle;
        }

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        loop {
            if *cancel.borrow() {
                return self.cancel(engine, &mut on_event);
            }

            tokio::select! {
                _ = interval.tick() => {
                    let now = self.clock.now_ms();
                    let finished = engine.tick(now);
                    on_event(&engine.snapshot(now));
                    if let Some(event) = finished {
                        on_event(&event);
                        debug!("ticker stopping: session finished");
                        return TickOutcome::Finished;
                    }
                    if !engine.is_running() {
                        return TickOutcome::Finished;
                    }
                }
                changed = cancel.changed() => {
                    // A dropped sender counts as cancellation.
                    if changed.is_err() || *cancel.borrow() {
                        return self.cancel(engine, &mut on_event);
                    }
                }
            }
        }
    }

    fn cancel<F: FnMut(&Event)>(&self, engine: &mut TimerEngine, on_event: &mut F) -> TickOutcome {
        debug!("ticker cancelled");
        match engine.pause(self.clock.now_ms()) {
            Some(event @ Event::SessionFinished { .. }) => {
                on_event(&event);
                TickOutcome::Finished
            }
            Some(event) => {
                on_event(&event);
                TickOutcome::Cancelled
            }
            None => TickOutcome::Cancelled,
        }
    }
}
