//! Phase stage
//!
//! Maps the current phase index to exactly one mounted [`PhaseInstance`].
//! Transitions follow a wait-for-exit policy: the outgoing instance is
//! released at the moment of the advance and lingers only as an inert
//! [`ExitingGhost`] while its exit plays, and the incoming instance mounts
//! at the same instant with its entrance delayed by the exit duration.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::PhaseError;

use super::choreography::{ChildCue, Choreography};
use super::instance::{InstanceSnapshot, MountId, PhaseDef, PhaseInstance};
use super::observer::StageObserver;
use super::state::PhaseTransition;

/// What remains of an outgoing phase while its exit animation plays.
///
/// A ghost owns no timers and no effect state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitingGhost {
    /// Phase name
    pub phase: String,
    /// Position in the phase set
    pub index: usize,
    /// Mount the ghost belongs to
    pub mount: MountId,
    /// When the exit started
    pub started: Instant,
    /// When the exit finishes
    pub until: Instant,
    /// Per-child exit cues, relative to `started`
    pub cues: Vec<ChildCue>,
}

impl ExitingGhost {
    /// Returns `true` while the exit is still playing at `now`.
    #[must_use]
    pub fn is_playing(&self, now: Instant) -> bool {
        now < self.until
    }
}

/// Point-in-time copy of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSnapshot {
    /// The mounted instance, if any
    pub mounted: Option<InstanceSnapshot>,
    /// Name and mount of the phase still playing its exit
    pub exiting: Option<(String, MountId)>,
}

/// Holder of the single mounted phase of a widget.
pub struct PhaseStage {
    widget: Arc<str>,
    phases: Vec<Arc<PhaseDef>>,
    choreography: Choreography,
    observer: Arc<dyn StageObserver>,
    mounted: Option<PhaseInstance>,
    exiting: Option<ExitingGhost>,
    next_mount: u64,
}

impl PhaseStage {
    /// Creates an empty stage over `phases`.
    #[must_use]
    pub fn new(
        widget: impl Into<Arc<str>>,
        phases: Vec<Arc<PhaseDef>>,
        choreography: Choreography,
        observer: Arc<dyn StageObserver>,
    ) -> Self {
        Self {
            widget: widget.into(),
            phases,
            choreography,
            observer,
            mounted: None,
            exiting: None,
            next_mount: 1,
        }
    }

    /// Widget key this stage belongs to.
    #[must_use]
    pub fn widget(&self) -> &str {
        &self.widget
    }

    /// Choreography used for entrances and exits.
    #[must_use]
    pub const fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// Phase definition at `index`.
    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&PhaseDef> {
        self.phases.get(index).map(AsRef::as_ref)
    }

    /// Replaces whatever is mounted with a fresh instance of phase `index`.
    ///
    /// The outgoing instance is released before the incoming one mounts.
    /// Transitioning to the phase that is already mounted remounts it from
    /// fresh state.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NotFound`] if `index` is out of range; the
    /// stage is left untouched in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn transition_to(&mut self, index: usize) -> Result<PhaseTransition, PhaseError> {
        let def = self
            .phases
            .get(index)
            .cloned()
            .ok_or_else(|| PhaseError::NotFound(format!("{}[{index}]", self.widget)))?;

        let now = Instant::now();
        let (from_phase, released_mount, cancelled_timers, entrance_delay) =
            match self.retire(now) {
                Some((from, mount, cancelled, exit)) => {
                    (Some(from), Some(mount), cancelled, exit)
                }
                None => (None, None, 0, Duration::ZERO),
            };

        let mount = MountId(self.next_mount);
        self.next_mount += 1;
        let instance = PhaseInstance::mount(
            Arc::clone(&self.widget),
            Arc::clone(&def),
            index,
            mount,
            entrance_delay,
            Arc::clone(&self.observer),
        );
        self.observer
            .phase_entered(instance.phase_ref(), entrance_delay);
        info!(
            widget = %self.widget,
            phase = %def.id,
            %mount,
            entrance_delay_ms = u64::try_from(entrance_delay.as_millis()).unwrap_or(u64::MAX),
            "phase entered"
        );
        self.mounted = Some(instance);

        Ok(PhaseTransition {
            from_phase,
            to_phase: index,
            released_mount,
            mounted: mount,
            cancelled_timers,
            entrance_delay,
        })
    }

    /// Releases the mounted instance without mounting another one.
    ///
    /// Any exiting ghost is discarded as well. Returns the number of timers
    /// that were still pending, or `None` if nothing was mounted.
    pub fn unmount(&mut self) -> Option<usize> {
        let released = self.retire(Instant::now()).map(|(_, _, cancelled, _)| cancelled);
        self.exiting = None;
        released
    }

    /// The mounted instance.
    #[must_use]
    pub const fn mounted(&self) -> Option<&PhaseInstance> {
        self.mounted.as_ref()
    }

    /// The outgoing phase, while its exit is still playing.
    #[must_use]
    pub fn exiting(&self) -> Option<&ExitingGhost> {
        let now = Instant::now();
        self.exiting.as_ref().filter(|g| g.is_playing(now))
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            mounted: self.mounted.as_ref().map(PhaseInstance::snapshot),
            exiting: self.exiting().map(|g| (g.phase.clone(), g.mount)),
        }
    }

    /// Releases the mounted instance and leaves a ghost in its place.
    fn retire(&mut self, now: Instant) -> Option<(usize, MountId, usize, Duration)> {
        let mut outgoing = self.mounted.take()?;
        let cancelled = outgoing.release();
        let children = outgoing.def().children.len();
        let exit = self.choreography.exit_duration(children);
        let phase = outgoing.phase_ref().clone();

        self.observer.phase_exited(&phase, cancelled);
        debug!(
            widget = %self.widget,
            phase = %phase.phase,
            mount = %phase.mount,
            cancelled,
            "phase exited"
        );

        self.exiting = Some(ExitingGhost {
            phase: phase.phase,
            index: phase.index,
            mount: phase.mount,
            started: now,
            until: now + exit,
            cues: self.choreography.exit_cues(children),
        });
        Some((phase.index, phase.mount, cancelled, exit))
    }
}

impl Drop for PhaseStage {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for PhaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseStage")
            .field("widget", &self.widget)
            .field("phases", &self.phases.len())
            .field("mounted", &self.mounted)
            .field("exiting", &self.exiting)
            .finish_non_exhaustive()
    }
}
