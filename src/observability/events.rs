//! Structured event stream.
//!
//! Discrete, typed widget lifecycle events serialized as newline-delimited
//! JSON (JSONL), each carrying a monotonically increasing sequence number.
//! [`EventEmitter`] is a [`StageObserver`], so it can be handed straight to
//! a widget.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::phase::{EffectState, MountId, PhaseRef, StageObserver};

/// A discrete event emitted by a running widget.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A widget mounted its first phase and started its timers.
    WidgetActivated {
        /// When the widget activated.
        timestamp: DateTime<Utc>,
        /// Widget key.
        widget: String,
        /// Number of phases cycled.
        phase_count: usize,
        /// Cycle interval in milliseconds (0 for panels).
        interval_ms: u64,
    },

    /// A widget was torn down.
    WidgetDeactivated {
        /// When the widget deactivated.
        timestamp: DateTime<Utc>,
        /// Widget key.
        widget: String,
    },

    /// A phase instance was mounted.
    PhaseEntered {
        /// When the phase mounted.
        timestamp: DateTime<Utc>,
        /// Widget key.
        widget: String,
        /// Phase name.
        phase: String,
        /// Zero-based phase index.
        phase_index: usize,
        /// Mount identifier.
        mount: MountId,
        /// Time the entrance waits for the previous exit.
        entrance_delay_ms: u64,
    },

    /// A phase instance was released.
    PhaseExited {
        /// When the phase was released.
        timestamp: DateTime<Utc>,
        /// Widget key.
        widget: String,
        /// Phase name.
        phase: String,
        /// Zero-based phase index.
        phase_index: usize,
        /// Mount identifier.
        mount: MountId,
        /// Timers that were still pending.
        cancelled_timers: usize,
    },

    /// An effect of a live phase changed.
    EffectUpdated {
        /// When the effect changed.
        timestamp: DateTime<Utc>,
        /// Widget key.
        widget: String,
        /// Phase name.
        phase: String,
        /// Mount identifier.
        mount: MountId,
        /// Effect name.
        effect: String,
        /// New effect state.
        state: EffectState,
    },
}

/// Wraps an [`Event`] with its sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization and I/O failures are dropped; a broken event sink must
/// never take a widget down with it.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        let mut w = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(line) = serde_json::to_string(&envelope) {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl StageObserver for EventEmitter {
    fn widget_activated(&self, widget: &str, phase_count: usize, interval: Duration) {
        self.emit(Event::WidgetActivated {
            timestamp: Utc::now(),
            widget: widget.to_string(),
            phase_count,
            interval_ms: millis(interval),
        });
    }

    fn widget_deactivated(&self, widget: &str) {
        self.emit(Event::WidgetDeactivated {
            timestamp: Utc::now(),
            widget: widget.to_string(),
        });
    }

    fn phase_entered(&self, phase: &PhaseRef, entrance_delay: Duration) {
        self.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            widget: phase.widget.to_string(),
            phase: phase.phase.clone(),
            phase_index: phase.index,
            mount: phase.mount,
            entrance_delay_ms: millis(entrance_delay),
        });
    }

    fn phase_exited(&self, phase: &PhaseRef, cancelled_timers: usize) {
        self.emit(Event::PhaseExited {
            timestamp: Utc::now(),
            widget: phase.widget.to_string(),
            phase: phase.phase.clone(),
            phase_index: phase.index,
            mount: phase.mount,
            cancelled_timers,
        });
    }

    fn effect_updated(&self, phase: &PhaseRef, effect: &str, state: &EffectState) {
        self.emit(Event::EffectUpdated {
            timestamp: Utc::now(),
            widget: phase.widget.to_string(),
            phase: phase.phase.clone(),
            mount: phase.mount,
            effect: effect.to_string(),
            state: state.clone(),
        });
    }
}
