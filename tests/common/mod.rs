//! Shared integration-test helpers: spawning the `mockupsim` binary and
//! locating fixtures, plus a recording observer for engine tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Mutex;
use std::time::Duration;

use mockupsim::phase::{EffectState, MountId, PhaseRef, StageObserver};

/// Runs the binary with `args` to completion.
///
/// Config-related environment variables are cleared so the host cannot
/// leak into the assertions.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mockupsim"))
        .args(args)
        .env_remove("MOCKUPSIM_CONFIG")
        .env_remove("MOCKUPSIM_COLOR")
        .env_remove("PUBLIC_WHATSAPP_NUMBER")
        .output()
        .expect("failed to spawn mockupsim")
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// One recorded observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Activated(String),
    Deactivated(String),
    Entered { phase: String, mount: MountId, delay: Duration },
    Exited { phase: String, mount: MountId },
    Effect { mount: MountId, effect: String, state: EffectState },
}

/// Observer that keeps every notification in order.
#[derive(Debug, Default)]
pub struct Recorder {
    notes: Mutex<Vec<Note>>,
}

impl Recorder {
    #[allow(clippy::missing_panics_doc)]
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    /// Phase names in the order they were entered.
    pub fn entered(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Entered { phase, .. } => Some(phase),
                _ => None,
            })
            .collect()
    }

    fn push(&self, note: Note) {
        self.notes.lock().unwrap().push(note);
    }
}

impl StageObserver for Recorder {
    fn widget_activated(&self, widget: &str, _phase_count: usize, _interval: Duration) {
        self.push(Note::Activated(widget.to_string()));
    }

    fn widget_deactivated(&self, widget: &str) {
        self.push(Note::Deactivated(widget.to_string()));
    }

    fn phase_entered(&self, phase: &PhaseRef, entrance_delay: Duration) {
        self.push(Note::Entered {
            phase: phase.phase.clone(),
            mount: phase.mount,
            delay: entrance_delay,
        });
    }

    fn phase_exited(&self, phase: &PhaseRef, _cancelled_timers: usize) {
        self.push(Note::Exited {
            phase: phase.phase.clone(),
            mount: phase.mount,
        });
    }

    fn effect_updated(&self, phase: &PhaseRef, effect: &str, state: &EffectState) {
        self.push(Note::Effect {
            mount: phase.mount,
            effect: effect.to_string(),
            state: state.clone(),
        });
    }
}
