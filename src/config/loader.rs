//! Site configuration loader.
//!
//! Pipeline:
//! 1. Size limit check
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing into the typed schema
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::config::schema::SiteConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

/// `$$`, `${VAR}` or `${VAR:-default}`.
static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
});

/// Limits guarding the loader against oversized input.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("MOCKUPSIM_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// A loaded and validated configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The frozen configuration
    pub config: Arc<SiteConfig>,

    /// Validation warnings
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
}

impl ConfigLoader {
    /// Creates a loader with explicit limits.
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Creates a loader with limits taken from the environment.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if the file cannot be read and
    /// any error of [`load_str`](Self::load_str) otherwise.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(size)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads and validates `raw`; `path` is only used in messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooLarge`], [`ConfigError::EnvVarNotSet`],
    /// [`ConfigError::ParseError`] or [`ConfigError::ValidationError`].
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw.len())?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let expanded = expand_env(raw, path)?;
        let config = if expanded.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str::<SiteConfig>(&expanded).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let result = Validator::new().validate(&config);
        for warning in &result.warnings {
            warn!(path = %path.display(), "{warning}");
        }
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        debug!(path = %path.display(), widgets = config.widgets.len(), "configuration loaded");
        Ok(LoadResult {
            config: Arc::new(config),
            warnings: result.warnings,
        })
    }

    const fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.limits.max_config_size {
            return Err(ConfigError::TooLarge {
                size,
                limit: self.limits.max_config_size,
            });
        }
        Ok(())
    }
}

/// Expands environment references in raw YAML text.
///
/// `$$` becomes a literal `$`. `${VAR:-default}` uses the default when
/// `VAR` is unset or empty. An unset variable without a default is an
/// error; the location names the file and line of the reference.
fn expand_env(raw: &str, path: &Path) -> Result<String, ConfigError> {
    expand_with(raw, path, |name| std::env::var(name).ok())
}

fn expand_with(
    raw: &str,
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in ENV_REF.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&raw[last..whole.start()]);
        last = whole.end();

        let Some(name) = caps.get(1) else {
            out.push('$');
            continue;
        };
        match (lookup(name.as_str()), caps.get(2)) {
            (Some(value), Some(default)) if value.is_empty() => out.push_str(default.as_str()),
            (Some(value), _) => out.push_str(&value),
            (None, Some(default)) => out.push_str(default.as_str()),
            (None, None) => {
                let line = raw[..whole.start()].matches('\n').count() + 1;
                return Err(ConfigError::EnvVarNotSet {
                    var: name.as_str().to_string(),
                    location: format!("{}:{line}", path.display()),
                });
            }
        }
    }
    out.push_str(&raw[last..]);
    Ok(out)
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::time::Duration;

    fn vars(name: &str) -> Option<String> {
        match name {
            "NUMBER" => Some("5511999990000".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    fn expand(raw: &str) -> Result<String, ConfigError> {
        expand_with(raw, Path::new("site.yaml"), vars)
    }

    #[test]
    fn test_expand_set_variable() {
        assert_eq!(expand("number: ${NUMBER}").unwrap(), "number: 5511999990000");
        assert_eq!(expand("x: '${EMPTY}'").unwrap(), "x: ''");
    }

    #[test]
    fn test_expand_default() {
        assert_eq!(expand("n: ${MISSING:-42}").unwrap(), "n: 42");
        assert_eq!(expand("n: ${NUMBER:-42}").unwrap(), "n: 5511999990000");
        assert_eq!(expand("n: ${MISSING:-}").unwrap(), "n: ");
    }

    #[test]
    fn test_expand_default_replaces_empty_value() {
        assert_eq!(expand("n: ${EMPTY:-42}").unwrap(), "n: 42");
        assert_eq!(expand("n: '${EMPTY}'").unwrap(), "n: ''");
    }

    #[test]
    fn test_empty_contact_number_falls_back_to_default() {
        let raw = "contact:\n  number: \"${PUBLIC_WHATSAPP_NUMBER:-5512983173077}\"\n";
        let expanded = expand_with(raw, Path::new("site.yaml"), |_| Some(String::new())).unwrap();
        assert_eq!(expanded, "contact:\n  number: \"5512983173077\"\n");

        let result = ConfigLoader::with_defaults()
            .load_str(&expanded, Path::new("site.yaml"))
            .unwrap();
        assert_eq!(result.config.contact.number.as_deref(), Some("5512983173077"));
    }

    #[test]
    fn test_expand_escaped_dollar() {
        assert_eq!(expand("price: $$100").unwrap(), "price: $100");
        assert_eq!(expand("cost: $5").unwrap(), "cost: $5");
    }

    #[test]
    fn test_expand_missing_reports_line() {
        let err = expand("a: 1\nb: ${MISSING}\n").unwrap_err();
        match err {
            ConfigError::EnvVarNotSet { var, location } => {
                assert_eq!(var, "MISSING");
                assert_eq!(location, "site.yaml:2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_str_valid() {
        let loader = ConfigLoader::new(ConfigLimits {
            max_config_size: 4096,
        });
        let result = loader
            .load_str(
                "widgets:\n  rescue:\n    cycle_interval: 4500ms\n",
                Path::new("inline.yaml"),
            )
            .unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.config.widget_config("rescue").cycle_interval,
            Some(Duration::from_millis(4500))
        );
    }

    #[test]
    fn test_load_str_empty_is_default() {
        let result = ConfigLoader::with_defaults()
            .load_str("", Path::new("empty.yaml"))
            .unwrap();
        assert!(result.config.widgets.is_empty());
    }

    #[test]
    fn test_load_str_size_limit() {
        let loader = ConfigLoader::new(ConfigLimits { max_config_size: 8 });
        let err = loader
            .load_str("widgets: {}\n", Path::new("big.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { size: 12, limit: 8 }));
    }

    #[test]
    fn test_load_str_parse_error() {
        let err = ConfigLoader::with_defaults()
            .load_str("widgets:\n  rescue: [\n", Path::new("bad.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_str_validation_error() {
        let err = ConfigLoader::with_defaults()
            .load_str("widgets:\n  nope: {}\n", Path::new("v.yaml"))
            .unwrap_err();
        match err {
            ConfigError::ValidationError { path, errors } => {
                assert_eq!(path, "v.yaml");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "widgets:\n  gmn-search:\n    class_name: shadow-xl").unwrap();
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.widget_config("gmn-search").class_name, "shadow-xl");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }
}
