use std::io::Write;

use clap::Subcommand;
use studytrack_core::timer::{now_ms, Clock, TickOutcome, Ticker, TimerEngine, TimerMode};
use studytrack_core::{Config, Event};
use tokio::sync::watch;
use tracing::warn;

use super::{alert, print_json, state_file, CmdResult};

const ENGINE_FILE: &str = "timer.json";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown and follow it until it finishes or Ctrl-C pauses it
    Run {
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Print the current timer state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Skip to the next mode in the cycle
    Next,
    /// Back to a fresh work interval
    Reset,
    /// Set the minutes of one mode (work 1-120, break 1-30, long-break 1-60)
    Set {
        /// work, break or long-break
        mode: TimerMode,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=120))]
        minutes: u32,
    },
}

/// Engine state kept between invocations, adjusted to the configured
/// durations.
fn load_engine(config: &Config) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let durations = config.durations()?;
    let path = state_file(ENGINE_FILE)?;
    let mut engine = match std::fs::read_to_string(&path) {
        Ok(json) => serde_json::from_str::<TimerEngine>(&json).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable timer state");
            TimerEngine::new(durations)
        }),
        Err(_) => TimerEngine::new(durations),
    };

    let now = now_ms();
    for mode in TimerMode::ALL {
        let minutes = durations.minutes(mode);
        if engine.durations().minutes(mode) != minutes {
            engine.configure_duration(mode, minutes, now)?;
        }
    }
    Ok(engine)
}

fn save_engine(engine: &TimerEngine) -> CmdResult {
    let json = serde_json::to_string(engine)?;
    std::fs::write(state_file(ENGINE_FILE)?, json)?;
    Ok(())
}

fn print_status(engine: &TimerEngine) {
    let state = if engine.is_running() { "running" } else { "paused" };
    println!(
        "{} {} ({state}, {:.0}% elapsed), {} work sessions completed",
        engine.mode(),
        engine.display(),
        engine.progress() * 100.0,
        engine.cycles_completed()
    );
}

fn render(config: &Config, json: bool, event: &Event) {
    alert(config, event);
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }
    let mut out = std::io::stdout();
    match event {
        Event::StateSnapshot { mode, display, .. } => {
            let _ = write!(out, "\r{mode} {display}  ");
        }
        Event::SessionFinished { mode, next_mode, .. } => {
            let _ = write!(out, "\n{mode} finished. Next: {next_mode}\n");
        }
        Event::TimerStarted { mode, remaining_ms, .. } => {
            let _ = writeln!(out, "{mode} started, {} min", remaining_ms / 60_000);
        }
        Event::TimerPaused { .. } => {
            let _ = writeln!(out);
        }
        _ => {}
    }
    let _ = out.flush();
}

async fn follow(config: &Config, engine: &mut TimerEngine, json: bool) -> TickOutcome {
    let ticker = Ticker::default();
    if let Some(event) = engine.start(ticker.clock().now_ms()) {
        render(config, json, &event);
    }

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });

    ticker.run(engine, rx, |event| render(config, json, event)).await
}

pub fn run(action: TimerAction) -> CmdResult {
    let mut config = Config::load()?;
    let mut engine = load_engine(&config)?;

    match action {
        TimerAction::Run { json } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let outcome = runtime.block_on(follow(&config, &mut engine, json));
            if !json && outcome == TickOutcome::Cancelled {
                println!("Paused at {}", engine.display());
            }
        }
        TimerAction::Status { json } => {
            let snapshot = engine.snapshot(now_ms());
            if json {
                print_json(&snapshot)?;
            } else {
                print_status(&engine);
            }
        }
        TimerAction::Next => {
            engine.skip(now_ms());
            print_status(&engine);
        }
        TimerAction::Reset => {
            engine.reset(now_ms());
            print_status(&engine);
        }
        TimerAction::Set { mode, minutes } => {
            let event = engine.configure_duration(mode, minutes, now_ms())?;
            config.timer.set_minutes(mode, minutes);
            config.save()?;
            if let Event::DurationChanged { interrupted: true, .. } = event {
                println!("{mode} set to {minutes} min; countdown restarted");
            } else {
                println!("{mode} set to {minutes} min");
            }
        }
    }

    save_engine(&engine)?;
    Ok(())
}
