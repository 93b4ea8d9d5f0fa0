//! `run` command handler.
//!
//! Activates one catalog widget on the real clock and prints a frame every
//! time what it shows changes, until `--duration` elapses or a signal
//! arrives.

use std::io::Write;
use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::args::{OutputFormat, RunArgs};
use crate::config::{ConfigLoader, SiteConfig};
use crate::error::MockupSimError;
use crate::observability::EventEmitter;
use crate::phase::{NoopObserver, StageObserver};
use crate::widget::{self, Mockup, Scene, WidgetConfig};

/// Run a widget until the duration elapses or `cancel` fires.
///
/// # Errors
///
/// Returns a config error for an unknown widget or a bad config file, an
/// I/O error if the event file cannot be created, or a phase error if the
/// widget fails to mount.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), MockupSimError> {
    let entry = widget::lookup(&args.widget)?;
    let config = widget_config(args, entry.key)?;

    let observer: Arc<dyn StageObserver> = match &args.events {
        Some(path) if path.as_os_str() == "-" => Arc::new(EventEmitter::stdout()),
        Some(path) => Arc::new(EventEmitter::from_file(path)?),
        None => Arc::new(NoopObserver),
    };

    let mut mockup = entry.instantiate(config, observer)?;
    info!(
        widget = entry.key,
        class = %mockup.container_class(),
        "starting widget"
    );
    mockup.activate()?;

    let result = render_loop(mockup.as_ref(), args, &cancel).await;
    mockup.deactivate();
    result
}

/// Merges the config file's entry for `key` with the command-line flags.
fn widget_config(args: &RunArgs, key: &str) -> Result<WidgetConfig, MockupSimError> {
    let site = match &args.config {
        Some(path) => ConfigLoader::with_defaults().load(path)?.config,
        None => Arc::new(SiteConfig::default()),
    };

    let mut config = site.widget_config(key);
    if let Some(interval) = args.cycle_interval {
        config.cycle_interval = Some(interval);
    }
    if let Some(class_name) = &args.class_name {
        config.class_name.clone_from(class_name);
    }
    Ok(config)
}

async fn render_loop(
    mockup: &dyn Mockup,
    args: &RunArgs,
    cancel: &CancellationToken,
) -> Result<(), MockupSimError> {
    let deadline = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut frames = tokio::time::interval(args.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last: Option<Scene> = None;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(widget = mockup.key(), "interrupted");
                break;
            }
            () = &mut deadline => {
                debug!(widget = mockup.key(), "duration elapsed");
                break;
            }
            _ = frames.tick() => {
                let scene = mockup.scene();
                if last.as_ref() != Some(&scene) {
                    print_frame(&scene, args.format)?;
                    last = Some(scene);
                }
            }
        }
    }
    Ok(())
}

fn print_frame(scene: &Scene, format: OutputFormat) -> Result<(), MockupSimError> {
    let mut out = std::io::stdout().lock();
    match format {
        OutputFormat::Human => writeln!(out, "{scene}\n")?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(scene)?)?,
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::cli::args::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["mockupsim", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "widgets:\n  rescue:\n    cycle_interval: 6s\n    class_name: from-file"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = run_args(&["rescue", "--config", path, "--class", "from-flag"]);
        let config = widget_config(&args, "rescue").unwrap();
        assert_eq!(config.cycle_interval, Some(Duration::from_secs(6)));
        assert_eq!(config.class_name, "from-flag");

        let args = run_args(&["rescue", "--config", path, "--cycle-interval", "2s"]);
        let config = widget_config(&args, "rescue").unwrap();
        assert_eq!(config.cycle_interval, Some(Duration::from_secs(2)));
        assert_eq!(config.class_name, "from-file");
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = run_args(&["rescue", "--config", "/no/such/site.yaml"]);
        assert!(widget_config(&args, "rescue").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_duration() {
        let args = run_args(&["rescue", "--duration", "9s"]);
        run(&args, CancellationToken::new()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let args = run_args(&["gmn-search"]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });
        run(&args, cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_unknown_widget() {
        let args = run_args(&["gmn-serch", "--duration", "1ms"]);
        let err = run(&args, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::ExitCode::CONFIG_ERROR);
        assert!(err.to_string().contains("gmn-search"));
    }
}
