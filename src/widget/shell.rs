//! Cycling widget shell
//!
//! A [`Widget`] composes a [`CycleDriver`] with a [`PhaseStage`] behind a
//! sized container. Activation mounts the first phase and starts the
//! driver; every advance swaps the mounted phase while the driver's lock is
//! held; deactivation stops the driver before unmounting, so no advance can
//! land after teardown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ConfigError, PhaseError};
use crate::phase::{
    Choreography, CycleDriver, NoopObserver, PhaseDef, PhaseId, PhaseSet, PhaseStage,
    StageObserver, StageSnapshot,
};

use super::render::{self, Scene};
use super::{Mockup, container_class};

/// Static description of a cycling widget.
#[derive(Debug, Clone)]
pub struct WidgetDef {
    /// Catalog key
    pub key: String,
    /// Human-readable title
    pub title: String,
    /// Interval used when the embedding does not set one
    pub default_interval: Duration,
    /// Entrance/exit preset shared by every phase
    pub choreography: Choreography,
    set: PhaseSet,
    phases: Vec<Arc<PhaseDef>>,
}

impl WidgetDef {
    /// Builds a widget definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for fewer than two phases, duplicate or empty
    /// phase names, a zero default interval, or an invalid effect.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        phases: Vec<PhaseDef>,
        default_interval: Duration,
        choreography: Choreography,
    ) -> Result<Self, ConfigError> {
        let set = PhaseSet::new(phases.iter().map(|p| p.id.as_str()))?;
        if default_interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                field: "default_interval".to_string(),
                value: default_interval,
            });
        }
        for phase in &phases {
            phase.validate()?;
        }
        Ok(Self {
            key: key.into(),
            title: title.into(),
            default_interval,
            choreography,
            set,
            phases: phases.into_iter().map(Arc::new).collect(),
        })
    }

    /// Ordered phase names.
    #[must_use]
    pub const fn phase_set(&self) -> &PhaseSet {
        &self.set
    }

    /// Phase definitions in cycle order.
    #[must_use]
    pub fn phases(&self) -> &[Arc<PhaseDef>] {
        &self.phases
    }
}

/// Embedding-time knobs of a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Overrides the widget's default cycle interval
    pub cycle_interval: Option<Duration>,
    /// Extra classes appended to the container class
    pub class_name: String,
}

/// Lifecycle state of a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WidgetState {
    /// Not mounted; no timers exist
    Inactive,
    /// Cycling, currently showing `phase`
    Active {
        /// Mounted phase
        phase: PhaseId,
        /// Its position in the phase set
        index: usize,
    },
}

/// Point-in-time copy of a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSnapshot {
    /// Catalog key
    pub key: String,
    /// Lifecycle state
    pub state: WidgetState,
    /// Current cycle interval
    pub interval: Duration,
    /// Advances since activation
    pub ticks: u64,
    /// Mounted and exiting phases
    pub stage: StageSnapshot,
}

/// A phase-cycling widget.
pub struct Widget {
    def: Arc<WidgetDef>,
    class_name: String,
    driver: CycleDriver,
    stage: Arc<Mutex<PhaseStage>>,
    observer: Arc<dyn StageObserver>,
}

impl Widget {
    /// Creates an inactive widget.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveInterval`] if the configured cycle
    /// interval is zero.
    pub fn new(def: Arc<WidgetDef>, config: WidgetConfig) -> Result<Self, ConfigError> {
        Self::with_observer(def, config, Arc::new(NoopObserver))
    }

    /// Creates an inactive widget that reports to `observer`.
    ///
    /// # Errors
    ///
    /// Same as [`Widget::new`].
    pub fn with_observer(
        def: Arc<WidgetDef>,
        config: WidgetConfig,
        observer: Arc<dyn StageObserver>,
    ) -> Result<Self, ConfigError> {
        let interval = config.cycle_interval.unwrap_or(def.default_interval);
        let driver = CycleDriver::new(def.set.len(), interval)?;
        let stage = PhaseStage::new(
            def.key.as_str(),
            def.phases.clone(),
            def.choreography.clone(),
            Arc::clone(&observer),
        );
        Ok(Self {
            def,
            class_name: config.class_name,
            driver,
            stage: Arc::new(Mutex::new(stage)),
            observer,
        })
    }

    /// The widget's definition.
    #[must_use]
    pub fn def(&self) -> &WidgetDef {
        &self.def
    }

    /// Mounts the first phase and starts cycling.
    ///
    /// A no-op on an active widget. After [`deactivate`](Self::deactivate)
    /// the widget starts again from the first phase.
    ///
    /// # Errors
    ///
    /// Cannot fail for a validated definition; the error type is shared with
    /// [`Mockup::activate`].
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn activate(&mut self) -> Result<(), PhaseError> {
        if self.driver.is_running() {
            return Ok(());
        }
        lock(&self.stage).transition_to(0)?;

        let stage = Arc::clone(&self.stage);
        let key = self.def.key.clone();
        self.driver.start(move |tick| {
            if let Err(e) = lock(&stage).transition_to(tick.to_index) {
                warn!(widget = %key, error = %e, "advance dropped");
            }
        });

        self.observer
            .widget_activated(&self.def.key, self.def.set.len(), self.driver.interval());
        info!(
            widget = %self.def.key,
            phases = self.def.set.len(),
            interval_ms = u64::try_from(self.driver.interval().as_millis()).unwrap_or(u64::MAX),
            "widget activated"
        );
        Ok(())
    }

    /// Stops cycling and unmounts everything. Idempotent.
    ///
    /// Returns `true` if the widget was active.
    pub fn deactivate(&mut self) -> bool {
        let was_running = self.driver.stop();
        let released = lock(&self.stage).unmount();
        if was_running {
            self.observer.widget_deactivated(&self.def.key);
            info!(
                widget = %self.def.key,
                cancelled_timers = released.unwrap_or(0),
                "widget deactivated"
            );
        }
        was_running
    }

    /// Changes the cycle interval; on an active widget the schedule restarts
    /// from now and the current phase stays mounted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveInterval`] for a zero interval.
    pub fn set_cycle_interval(&mut self, interval: Duration) -> Result<(), ConfigError> {
        self.driver.set_interval(interval)
    }

    /// Current cycle interval.
    #[must_use]
    pub const fn cycle_interval(&self) -> Duration {
        self.driver.interval()
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> WidgetState {
        let stage = lock(&self.stage);
        match stage.mounted() {
            Some(instance) => WidgetState::Active {
                phase: instance.def().id.clone(),
                index: instance.index(),
            },
            None => WidgetState::Inactive,
        }
    }

    /// Mounted phase, if active.
    #[must_use]
    pub fn current_phase(&self) -> Option<PhaseId> {
        match self.state() {
            WidgetState::Active { phase, .. } => Some(phase),
            WidgetState::Inactive => None,
        }
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        let ticks = self.driver.state().ticks();
        let stage = lock(&self.stage).snapshot();
        let state = match &stage.mounted {
            Some(m) => WidgetState::Active {
                phase: PhaseId::new(m.phase.clone()),
                index: m.index,
            },
            None => WidgetState::Inactive,
        };
        WidgetSnapshot {
            key: self.def.key.clone(),
            state,
            interval: self.driver.interval(),
            ticks,
            stage,
        }
    }

    /// Extra container classes.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Full container class string.
    #[must_use]
    pub fn container_class(&self) -> String {
        container_class(&self.class_name)
    }
}

impl Mockup for Widget {
    fn key(&self) -> &str {
        &self.def.key
    }

    fn activate(&mut self) -> Result<(), PhaseError> {
        Self::activate(self)
    }

    fn deactivate(&mut self) -> bool {
        Self::deactivate(self)
    }

    fn is_active(&self) -> bool {
        self.driver.is_running()
    }

    fn container_class(&self) -> String {
        Self::container_class(self)
    }

    fn scene(&self) -> Scene {
        render::scene(&self.def.title, &lock(&self.stage))
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("key", &self.def.key)
            .field("class_name", &self.class_name)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

fn lock(stage: &Mutex<PhaseStage>) -> MutexGuard<'_, PhaseStage> {
    stage.lock().unwrap_or_else(PoisonError::into_inner)
}
