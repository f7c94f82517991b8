use clap::Args;
use studytrack_core::Config;

use super::task::ListArgs;
use super::{open_session, print_json, CmdResult};

#[derive(Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub filter: ListArgs,
}

pub fn run(args: OverviewArgs) -> CmdResult {
    let config = Config::load()?;
    let session = open_session(&config, args.filter.subject.as_deref())?;
    let lines = session.overview(&args.filter.query(&session));

    if args.filter.json {
        return print_json(&lines);
    }
    let Some(subject) = session.selected_subject() else {
        println!("No tasks yet.");
        return Ok(());
    };

    println!("{subject}");
    let (mut done, mut total) = (0, 0);
    for line in &lines {
        done += line.progress.done;
        total += line.progress.total;
        let status = if line.progress.completed { "completed" } else { "" };
        println!(
            "  {:<24} {:>3}%  {:>3}/{:<3} {status}",
            line.chapter, line.progress.percent, line.progress.done, line.progress.total
        );
    }
    if total > 0 {
        println!("  {:<24} {:>3}%  {:>3}/{:<3}", "total", (100 * done + total / 2) / total, done, total);
    }
    Ok(())
}
