//! `list` command handler.

use serde::Serialize;

use crate::cli::args::{ListArgs, OutputFormat};
use crate::error::MockupSimError;
use crate::widget::catalog::{self, EntryKind};

#[derive(Debug, Serialize)]
struct Listing {
    key: &'static str,
    title: &'static str,
    description: &'static str,
    kind: EntryKind,
    phases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_interval_ms: Option<u64>,
}

/// Print the built-in widgets.
///
/// # Errors
///
/// Returns a config error if a built-in definition fails to validate.
pub fn run(args: &ListArgs) -> Result<(), MockupSimError> {
    let listings = listings()?;

    match args.format {
        OutputFormat::Human => {
            for l in &listings {
                let interval = l
                    .default_interval_ms
                    .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
                println!("{:<16} {:<8} {:>7}  {}", l.key, kind_label(l.kind), interval, l.title);
                println!("{:<16} phases: {}", "", l.phases.join(" -> "));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings)?),
    }
    Ok(())
}

fn listings() -> Result<Vec<Listing>, MockupSimError> {
    catalog::catalog()
        .iter()
        .map(|entry| -> Result<Listing, MockupSimError> {
            let blueprint = entry.blueprint()?;
            Ok(Listing {
                key: entry.key,
                title: entry.title,
                description: entry.description,
                kind: entry.kind,
                phases: blueprint.phase_names(),
                default_interval_ms: blueprint
                    .default_interval()
                    .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            })
        })
        .collect()
}

const fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Cycling => "cycling",
        EntryKind::Panel => "panel",
    }
}
