//! Stage observer hooks.
//!
//! A [`StageObserver`] is told about every mount, unmount and effect update
//! of a widget. Hooks run on the timer task that caused them, while the
//! instance or stage lock is held, so implementations must be quick and must
//! not call back into the widget.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::effects::EffectState;
use super::instance::MountId;

/// Identifies one mounted lifetime of a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseRef {
    /// Widget key
    pub widget: Arc<str>,
    /// Phase name
    pub phase: String,
    /// Position in the widget's phase set
    pub index: usize,
    /// Mount the event belongs to
    pub mount: MountId,
}

/// Receives lifecycle notifications from widgets and stages.
///
/// Every method has a no-op default.
pub trait StageObserver: Send + Sync {
    /// A widget started cycling.
    fn widget_activated(&self, _widget: &str, _phase_count: usize, _interval: Duration) {}

    /// A widget was torn down.
    fn widget_deactivated(&self, _widget: &str) {}

    /// A phase instance was mounted.
    fn phase_entered(&self, _phase: &PhaseRef, _entrance_delay: Duration) {}

    /// A phase instance was released; `cancelled_timers` were still pending.
    fn phase_exited(&self, _phase: &PhaseRef, _cancelled_timers: usize) {}

    /// A sub-timer changed an effect of a live instance.
    fn effect_updated(&self, _phase: &PhaseRef, _effect: &str, _state: &EffectState) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}
