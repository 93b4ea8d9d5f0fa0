//! Site configuration schema.
//!
//! Typed form of the YAML file that tunes the built-in widgets and the
//! contact number. Unknown fields are rejected at every level.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::contact::ContactLinks;
use crate::error::ConfigError;
use crate::widget::WidgetConfig;

/// Root of a site configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Contact link settings
    #[serde(default)]
    pub contact: ContactConfig,

    /// Per-widget overrides keyed by catalog key, in file order
    #[serde(default)]
    pub widgets: IndexMap<String, WidgetOverride>,
}

/// Contact link settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContactConfig {
    /// Business number, digits only; falls back to the process default
    pub number: Option<String>,
}

/// Embedding overrides for one widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetOverride {
    /// Cycle interval as a human-readable duration (`"4s"`, `"4500ms"`)
    #[serde(
        default,
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub cycle_interval: Option<Duration>,

    /// Cycle interval in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_interval_ms: Option<u64>,

    /// Extra container classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl WidgetOverride {
    /// The interval set by either field, preferring `cycle_interval`.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.cycle_interval
            .or_else(|| self.cycle_interval_ms.map(Duration::from_millis))
    }

    /// Converts to the widget's embedding knobs.
    #[must_use]
    pub fn to_widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            cycle_interval: self.interval(),
            class_name: self.class_name.clone().unwrap_or_default(),
        }
    }
}

impl SiteConfig {
    /// Embedding knobs for `key`, defaults when the file does not mention it.
    #[must_use]
    pub fn widget_config(&self, key: &str) -> WidgetConfig {
        self.widgets
            .get(key)
            .map(WidgetOverride::to_widget_config)
            .unwrap_or_default()
    }

    /// Contact link builder for this site.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a malformed number.
    pub fn contact_links(&self) -> Result<ContactLinks, ConfigError> {
        match &self.contact.number {
            Some(number) => ContactLinks::new(number.trim()),
            None => Ok(ContactLinks::global().clone()),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    humantime::parse_duration(raw.trim())
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid duration '{raw}': {e}")))
}

#[allow(clippy::ref_option)]
fn serialize_duration<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
contact:
  number: "5511999990000"
widgets:
  gmn-search:
    cycle_interval: 5s
    class_name: shadow-xl
  rescue:
    cycle_interval_ms: 4500
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.contact.number.as_deref(), Some("5511999990000"));
        assert_eq!(
            config.widgets.keys().collect::<Vec<_>>(),
            ["gmn-search", "rescue"]
        );

        let gmn = config.widget_config("gmn-search");
        assert_eq!(gmn.cycle_interval, Some(Duration::from_secs(5)));
        assert_eq!(gmn.class_name, "shadow-xl");

        let rescue = config.widget_config("rescue");
        assert_eq!(rescue.cycle_interval, Some(Duration::from_millis(4500)));
        assert_eq!(rescue.class_name, "");

        assert_eq!(config.widget_config("dashboard"), WidgetConfig::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: SiteConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "widgets:\n  rescue:\n    interval: 4s\n";
        let err = serde_yaml::from_str::<SiteConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_bad_duration_rejected() {
        let yaml = "widgets:\n  rescue:\n    cycle_interval: soon\n";
        let err = serde_yaml::from_str::<SiteConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid duration 'soon'"));
    }

    #[test]
    fn test_contact_links_from_config() {
        let config = SiteConfig {
            contact: ContactConfig {
                number: Some("5521900000000".into()),
            },
            ..SiteConfig::default()
        };
        assert_eq!(config.contact_links().unwrap().number(), "5521900000000");

        let bad = SiteConfig {
            contact: ContactConfig {
                number: Some("abc".into()),
            },
            ..SiteConfig::default()
        };
        assert!(bad.contact_links().is_err());
    }
}
