use clap::Subcommand;
use serde::Serialize;
use studytrack_core::Config;

use super::{open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// List subjects; the selected one is marked with `*`
    List {
        #[arg(long)]
        json: bool,
    },
    /// Select the subject shown by list, overview and export
    Select {
        name: String,
    },
}

#[derive(Serialize)]
struct SubjectList {
    subjects: Vec<String>,
    selected: Option<String>,
}

pub fn run(action: SubjectAction) -> CmdResult {
    let mut config = Config::load()?;

    match action {
        SubjectAction::List { json } => {
            let session = open_session(&config, None)?;
            let list = SubjectList {
                subjects: session.subjects(),
                selected: session.selected_subject().map(str::to_string),
            };
            if json {
                return print_json(&list);
            }
            if list.subjects.is_empty() {
                println!("No subjects yet.");
            }
            for subject in &list.subjects {
                let mark = if list.selected.as_ref() == Some(subject) { "*" } else { " " };
                println!("{mark} {subject}");
            }
        }
        SubjectAction::Select { name } => {
            let mut session = open_session(&config, None)?;
            let selected = session.select_subject(Some(name.as_str())).map(str::to_string);
            match selected {
                Some(subject) if subject == name => {
                    config.view.subject = Some(subject);
                    config.save()?;
                    println!("Selected subject: {name}");
                }
                _ => return Err(format!("unknown subject '{name}'").into()),
            }
        }
    }
    Ok(())
}
