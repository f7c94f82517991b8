use std::path::PathBuf;

use clap::Args;
use studytrack_core::study::export_file_name;
use studytrack_core::Config;

use super::{open_session, CmdResult};

#[derive(Args)]
pub struct ExportArgs {
    /// Subject to export instead of the selected one
    #[arg(long)]
    pub subject: Option<String>,
    /// Output file; `-` writes to stdout. Defaults to `{subject}_tasks.csv`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: ExportArgs) -> CmdResult {
    let config = Config::load()?;
    let session = open_session(&config, args.subject.as_deref())?;

    let (Some(subject), Some(csv)) = (session.selected_subject(), session.export_csv()) else {
        eprintln!("Nothing to export.");
        return Ok(());
    };

    match args.output {
        Some(path) if path.as_os_str() == "-" => print!("{csv}"),
        output => {
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(subject)));
            std::fs::write(&path, csv)?;
            println!("Exported {subject} to {}", path.display());
        }
    }
    Ok(())
}
