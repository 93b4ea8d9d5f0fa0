//! Error types for `mockupsim`
//!
//! Configuration problems are the only errors the engine itself can
//! produce; everything else here exists for the CLI and config loader.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `mockupsim` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure, bad widget setup)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Phase engine error (unknown phase, widget not active)
    pub const PHASE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `mockupsim` operations.
#[derive(Debug, Error)]
pub enum MockupSimError {
    /// Configuration loading, validation or widget construction error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Phase engine error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockupSimError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Phase(_) => ExitCode::PHASE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration errors.
///
/// Raised both by the YAML loader and by the engine constructors, which
/// reject malformed setups up front instead of degrading into a broken timer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A phase set needs at least two phases to cycle
    #[error("phase set needs at least 2 phases, got {count}")]
    TooFewPhases {
        /// Number of phases supplied
        count: usize,
    },

    /// The same phase identifier appears twice in a phase set
    #[error("duplicate phase '{name}' in phase set")]
    DuplicatePhase {
        /// The repeated identifier
        name: String,
    },

    /// A phase identifier is empty
    #[error("phase identifier at position {index} is empty")]
    EmptyPhaseName {
        /// Position of the empty identifier
        index: usize,
    },

    /// A cycle driver was built over zero phases
    #[error("cycle driver needs a positive phase count")]
    ZeroPhaseCount,

    /// A timing value that must be positive was zero
    #[error("'{field}' must be a positive duration, got {value:?}")]
    NonPositiveInterval {
        /// Name of the offending setting
        field: String,
        /// The rejected value
        value: Duration,
    },

    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration is {size} bytes (limit: {limit})")]
    TooLarge {
        /// Actual size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// No widget with this key exists in the catalog
    #[error("unknown widget '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownWidget {
        /// The requested key
        name: String,
        /// Closest catalog key, if any is close enough
        suggestion: Option<String>,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "widgets.gmn-search.cycle_interval")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Phase Engine Errors
// ============================================================================

/// Phase engine errors.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// Referenced phase does not exist
    #[error("phase not found: {0}")]
    NotFound(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `mockupsim` operations.
pub type Result<T> = std::result::Result<T, MockupSimError>;

// ============================================================================
// Tests
// ============================================================================
