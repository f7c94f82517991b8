mod engine;
mod mode;
mod ticker;

pub use engine::{now_ms, TimerEngine};
pub use mode::{check_minutes, format_clock, Durations, TimerMode, CYCLES_BEFORE_LONG_BREAK};
pub use ticker::{Clock, SystemClock, TickOutcome, Ticker};
