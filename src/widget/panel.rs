//! Non-cycling panel
//!
//! A [`Panel`] mounts its single phase once on activation and keeps it for
//! the whole active lifetime. It has no driver; only the phase's own effect
//! timers run.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{ConfigError, PhaseError};
use crate::phase::{
    Choreography, InstanceSnapshot, NoopObserver, PhaseDef, PhaseStage, StageObserver,
};

use super::render::{self, Scene};
use super::{Mockup, container_class};

/// Static description of a panel.
#[derive(Debug, Clone)]
pub struct PanelDef {
    /// Catalog key
    pub key: String,
    /// Human-readable title
    pub title: String,
    /// The one phase shown while active
    pub phase: Arc<PhaseDef>,
    /// Entrance preset
    pub choreography: Choreography,
}

impl PanelDef {
    /// Builds a panel definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an effect of `phase` is invalid.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        phase: PhaseDef,
        choreography: Choreography,
    ) -> Result<Self, ConfigError> {
        if phase.id.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyPhaseName { index: 0 });
        }
        phase.validate()?;
        Ok(Self {
            key: key.into(),
            title: title.into(),
            phase: Arc::new(phase),
            choreography,
        })
    }
}

/// A widget that shows one live phase.
pub struct Panel {
    def: Arc<PanelDef>,
    class_name: String,
    stage: PhaseStage,
    observer: Arc<dyn StageObserver>,
}

impl Panel {
    /// Creates an inactive panel.
    #[must_use]
    pub fn new(def: Arc<PanelDef>, class_name: impl Into<String>) -> Self {
        Self::with_observer(def, class_name, Arc::new(NoopObserver))
    }

    /// Creates an inactive panel that reports to `observer`.
    #[must_use]
    pub fn with_observer(
        def: Arc<PanelDef>,
        class_name: impl Into<String>,
        observer: Arc<dyn StageObserver>,
    ) -> Self {
        let stage = PhaseStage::new(
            def.key.as_str(),
            vec![Arc::clone(&def.phase)],
            def.choreography.clone(),
            Arc::clone(&observer),
        );
        Self {
            def,
            class_name: class_name.into(),
            stage,
            observer,
        }
    }

    /// State of the mounted phase, if active.
    #[must_use]
    pub fn snapshot(&self) -> Option<InstanceSnapshot> {
        self.stage.mounted().map(|m| m.snapshot())
    }
}

impl Mockup for Panel {
    fn key(&self) -> &str {
        &self.def.key
    }

    fn activate(&mut self) -> Result<(), PhaseError> {
        if self.stage.mounted().is_some() {
            return Ok(());
        }
        self.stage.transition_to(0)?;
        self.observer
            .widget_activated(&self.def.key, 1, Duration::ZERO);
        info!(widget = %self.def.key, "panel activated");
        Ok(())
    }

    fn deactivate(&mut self) -> bool {
        let Some(cancelled_timers) = self.stage.unmount() else {
            return false;
        };
        self.observer.widget_deactivated(&self.def.key);
        info!(widget = %self.def.key, cancelled_timers, "panel deactivated");
        true
    }

    fn is_active(&self) -> bool {
        self.stage.mounted().is_some()
    }

    fn container_class(&self) -> String {
        container_class(&self.class_name)
    }

    fn scene(&self) -> Scene {
        render::scene(&self.def.title, &self.stage)
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("key", &self.def.key)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::phase::{Effect, EffectState};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn panel() -> Panel {
        let phase = PhaseDef::new("live", ["stats"]).with_effect(Effect::feed(
            "leads",
            vec![1],
            ms(1000),
            ms(1200),
            5,
            6,
            "Lead #{id}",
        ));
        let def = PanelDef::new("dash", "Dash", phase, Choreography::fade()).unwrap();
        Panel::new(Arc::new(def), "")
    }

    fn leads(p: &Panel) -> Vec<u64> {
        match p.snapshot().unwrap().effect("leads") {
            Some(EffectState::Feed { items, .. }) => items.iter().copied().collect(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_runs_effects_while_active() {
        let mut p = panel();
        assert!(!p.is_active());
        p.activate().unwrap();
        p.activate().unwrap();
        assert!(p.is_active());

        tokio::time::sleep(ms(2201)).await;
        assert_eq!(leads(&p), [3, 2, 1]);

        assert!(p.deactivate());
        assert!(!p.deactivate());
        assert!(p.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_reactivation_resets_feed() {
        let mut p = panel();
        p.activate().unwrap();
        tokio::time::sleep(ms(5000)).await;
        p.deactivate();

        p.activate().unwrap();
        assert_eq!(leads(&p), [1]);
    }
}
