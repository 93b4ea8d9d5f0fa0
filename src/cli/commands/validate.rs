//! `validate` command handler.
//!
//! Loads each file through the regular loader and reports what it found.
//! With `--strict`, warnings fail the run as well.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, MockupSimError, Severity, ValidationIssue};

#[derive(Debug, Serialize)]
struct Issue {
    severity: &'static str,
    path: String,
    message: String,
}

impl From<&ValidationIssue> for Issue {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            severity: match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            path: issue.path.clone(),
            message: issue.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    issues: Vec<Issue>,
    #[serde(skip)]
    failure: Option<ConfigError>,
}

/// Validate every file and print a report.
///
/// # Errors
///
/// Returns the first file's failure once every file has been reported.
pub fn run(args: &ValidateArgs) -> Result<(), MockupSimError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports: Vec<FileReport> = args
        .files
        .iter()
        .map(|path| check(&loader, path, args.strict))
        .collect();

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                let status = if report.valid { "ok" } else { "FAILED" };
                println!("{}: {status}", report.file);
                for issue in &report.issues {
                    println!("  {}: {} at {}", issue.severity, issue.message, issue.path);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    match reports.iter_mut().find_map(|r| r.failure.take()) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> FileReport {
    let file = path.display().to_string();
    tracing::info!(file = %file, "validating configuration");

    match loader.load(path) {
        Ok(result) => {
            let issues: Vec<Issue> = result.warnings.iter().map(Issue::from).collect();
            let failure = (strict && !result.warnings.is_empty()).then(|| {
                ConfigError::ValidationError {
                    path: file.clone(),
                    errors: result.warnings,
                }
            });
            FileReport {
                valid: failure.is_none(),
                file,
                issues,
                failure,
            }
        }
        Err(err) => {
            let issues = match &err {
                ConfigError::ValidationError { errors, .. } => {
                    errors.iter().map(Issue::from).collect()
                }
                other => vec![Issue {
                    severity: "error",
                    path: String::new(),
                    message: other.to_string(),
                }],
            };
            FileReport {
                file,
                valid: false,
                issues,
                failure: Some(err),
            }
        }
    }
}
