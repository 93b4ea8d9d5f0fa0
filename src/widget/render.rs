//! Text rendering of a stage.
//!
//! Pure mapping from a stage's definitions and snapshot to a few lines of
//! text, used by the CLI to print frames.

use std::fmt;

use serde::Serialize;

use crate::phase::{CounterStyle, EffectKind, EffectState, InstanceSnapshot, PhaseDef, PhaseStage};

/// Opacity above which a child counts as visible.
const VISIBLE_OPACITY: f64 = 0.5;

/// Rendered frame of a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    /// Widget title
    pub title: String,
    /// Mounted phase, if any
    pub phase: Option<String>,
    /// Phase still playing its exit, if any
    pub exiting: Option<String>,
    /// Body lines
    pub lines: Vec<String>,
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.title)?;
        match &self.phase {
            Some(phase) => write!(f, " {phase}")?,
            None => write!(f, " (inactive)")?,
        }
        if let Some(exiting) = &self.exiting {
            write!(f, " <- {exiting}")?;
        }
        for line in &self.lines {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Renders whatever `stage` shows right now.
#[must_use]
pub fn scene(title: &str, stage: &PhaseStage) -> Scene {
    let snapshot = stage.snapshot();
    let lines = snapshot
        .mounted
        .as_ref()
        .and_then(|m| stage.phase(m.index).map(|def| body(stage, def, m)))
        .unwrap_or_default();
    Scene {
        title: title.to_string(),
        phase: snapshot.mounted.map(|m| m.phase),
        exiting: snapshot.exiting.map(|(phase, _)| phase),
        lines,
    }
}

fn body(stage: &PhaseStage, def: &PhaseDef, instance: &InstanceSnapshot) -> Vec<String> {
    let cues = stage
        .choreography()
        .entrance_cues(def.children.len(), instance.entrance_delay);
    let mut lines: Vec<String> = def
        .children
        .iter()
        .zip(&cues)
        .filter(|(_, cue)| cue.sample(instance.age).opacity >= VISIBLE_OPACITY)
        .map(|(label, _)| label.clone())
        .collect();

    if instance.age >= instance.entrance_delay {
        for (effect, (_, state)) in def.effects.iter().zip(&instance.effects) {
            if let Some(line) = effect_line(&effect.kind, state) {
                lines.push(line);
            }
        }
    }
    lines
}

/// One line for an effect, or `None` if it shows nothing yet.
#[must_use]
pub fn effect_line(kind: &EffectKind, state: &EffectState) -> Option<String> {
    match (kind, state) {
        (
            EffectKind::Counter {
                style: CounterStyle::Stars,
                ..
            },
            EffectState::Counter { value, max },
        ) => Some(stars(*value, *max)),
        (
            EffectKind::Counter {
                style: CounterStyle::Score,
                ..
            },
            EffectState::Counter { value, max },
        ) => Some(format!("{value}/{max}")),
        (EffectKind::Reveal { label, .. }, EffectState::Reveal { shown: true }) => {
            Some(label.clone())
        }
        (EffectKind::Typewriter { .. }, EffectState::Typewriter { revealed, .. }) => {
            if *revealed == 0 {
                return None;
            }
            let text = state.revealed_text();
            if state.is_settled() {
                Some(format!("\"{text}\""))
            } else {
                Some(format!("\"{text}|"))
            }
        }
        (EffectKind::Feed { item_label, .. }, EffectState::Feed { items, .. }) => Some(
            items
                .iter()
                .map(|id| item_label.replace("{id}", &id.to_string()))
                .collect::<Vec<_>>()
                .join(" / "),
        ),
        _ => None,
    }
}

fn stars(value: u32, max: u32) -> String {
    let filled = value.min(max) as usize;
    let empty = max.saturating_sub(value) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}
