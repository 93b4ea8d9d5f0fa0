//! Site configuration validation.
//!
//! Runs after deserialization and collects every issue instead of stopping
//! at the first one, so `mockupsim validate` can report them all at once.

use std::time::Duration;

use crate::config::schema::{SiteConfig, WidgetOverride};
use crate::contact::ContactLinks;
use crate::error::{Severity, ValidationIssue};
use crate::widget::catalog::{self, EntryKind};

/// Intervals shorter than this are almost certainly a units mistake.
const MIN_SENSIBLE_INTERVAL: Duration = Duration::from_millis(250);

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Problems that prevent the configuration from being used
    pub errors: Vec<ValidationIssue>,

    /// Informational findings
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Semantic validator for [`SiteConfig`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config`, collecting every error and warning.
    pub fn validate(&mut self, config: &SiteConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_contact(config);
        for (key, widget) in &config.widgets {
            self.validate_widget(key, widget);
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_contact(&mut self, config: &SiteConfig) {
        if let Some(number) = &config.contact.number
            && let Err(e) = ContactLinks::new(number.trim())
        {
            self.add_error("contact.number", e.to_string());
        }
    }

    fn validate_widget(&mut self, key: &str, widget: &WidgetOverride) {
        let path = format!("widgets.{key}");
        let entry = match catalog::lookup(key) {
            Ok(entry) => entry,
            Err(e) => {
                self.add_error(&path, e.to_string());
                return;
            }
        };

        if widget.cycle_interval.is_some() && widget.cycle_interval_ms.is_some() {
            self.add_error(
                &path,
                "set either 'cycle_interval' or 'cycle_interval_ms', not both",
            );
        }

        if let Some(interval) = widget.interval() {
            let field = if widget.cycle_interval.is_some() {
                "cycle_interval"
            } else {
                "cycle_interval_ms"
            };
            if entry.kind == EntryKind::Panel {
                self.add_warning(
                    &format!("{path}.{field}"),
                    format!("'{key}' does not cycle; the interval is ignored"),
                );
            } else if interval.is_zero() {
                self.add_error(&format!("{path}.{field}"), "cycle interval must be positive");
            } else if interval < MIN_SENSIBLE_INTERVAL {
                self.add_warning(
                    &format!("{path}.{field}"),
                    format!(
                        "cycle interval of {}ms is shorter than the exit animation",
                        interval.as_millis()
                    ),
                );
            }
        }

        if let Some(class) = &widget.class_name
            && class.trim().is_empty()
        {
            self.add_warning(&format!("{path}.class_name"), "class name is empty");
        }
    }

    fn add_error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}
