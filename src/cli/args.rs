//! CLI argument definitions.
//!
//! All Clap derive structs for `mockupsim` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Runs the site's mockup simulator widgets in the terminal.
#[derive(Parser, Debug)]
#[command(name = "mockupsim", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "MOCKUPSIM_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Activate a widget on a real clock and print its frames.
    Run(RunArgs),

    /// List the built-in widgets.
    List(ListArgs),

    /// Print a contact deep link.
    Link(LinkArgs),

    /// Validate site configuration files.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Catalog key of the widget to run.
    pub widget: String,

    /// Cycle interval override (e.g. `4s`, `4500ms`).
    #[arg(long, value_parser = parse_duration)]
    pub cycle_interval: Option<Duration>,

    /// Extra container classes.
    #[arg(long = "class")]
    pub class_name: Option<String>,

    /// Deactivate after this long; runs until interrupted when omitted.
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Site configuration file.
    #[arg(short, long, env = "MOCKUPSIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write JSONL events to this file (`-` for stdout).
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// How often the scene is sampled for changes.
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub frame_interval: Duration,

    /// Frame output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `link`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("text").required(true).multiple(false))]
pub struct LinkArgs {
    /// Message to pre-fill.
    #[arg(group = "text")]
    pub message: Option<String>,

    /// Use a canned message by key (see `--list-presets`).
    #[arg(long, group = "text")]
    pub preset: Option<String>,

    /// List canned message keys and exit.
    #[arg(long, group = "text")]
    pub list_presets: bool,

    /// Business number, digits only. Overrides the config file.
    #[arg(long)]
    pub number: Option<String>,

    /// Site configuration file to take the number from.
    #[arg(short, long, env = "MOCKUPSIM_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let d = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if d.is_zero() {
        return Err("duration must be positive".to_string());
    }
    Ok(d)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "mockupsim",
            "run",
            "gmn-search",
            "--cycle-interval",
            "2s",
            "--class",
            "shadow-xl",
            "--duration",
            "500ms",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.widget, "gmn-search");
        assert_eq!(args.cycle_interval, Some(Duration::from_secs(2)));
        assert_eq!(args.class_name.as_deref(), Some("shadow-xl"));
        assert_eq!(args.duration, Some(Duration::from_millis(500)));
        assert_eq!(args.frame_interval, Duration::from_millis(100));
        assert_eq!(args.format, OutputFormat::Human);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cli = Cli::try_parse_from(["mockupsim", "run", "rescue", "--cycle-interval", "0s"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_garbage_interval_rejected() {
        let cli = Cli::try_parse_from(["mockupsim", "run", "rescue", "--cycle-interval", "soon"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_link_requires_message_or_preset() {
        assert!(Cli::try_parse_from(["mockupsim", "link"]).is_err());
        assert!(Cli::try_parse_from(["mockupsim", "link", "hi", "--preset", "contato"]).is_err());
        assert!(Cli::try_parse_from(["mockupsim", "link", "--preset", "contato"]).is_ok());
        assert!(Cli::try_parse_from(["mockupsim", "link", "--list-presets"]).is_ok());
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["mockupsim", "validate"]).is_err());
        assert!(Cli::try_parse_from(["mockupsim", "validate", "a.yaml", "--strict"]).is_ok());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["mockupsim", "list", "-vv", "--color", "never"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["mockupsim", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["mockupsim", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
