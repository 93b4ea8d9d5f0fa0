//! Mounted phase instances
//!
//! A [`PhaseInstance`] is one mounted lifetime of a [`PhaseDef`]. Mounting
//! creates fresh effect state and starts every effect timer in a private
//! [`TaskScope`]; releasing flips the instance to dead and cancels the scope
//! while the instance lock is held. Every timer callback takes the same lock
//! and bails out on a dead instance, so nothing mutates state after release.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::timer::TaskScope;

use super::effects::{Effect, EffectKind, EffectState};
use super::observer::{PhaseRef, StageObserver};
use super::set::PhaseId;

/// Identifier of one mounted lifetime within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MountId(pub u64);

impl std::fmt::Display for MountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mount#{}", self.0)
    }
}

/// What a phase shows and which effects run while it is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDef {
    /// Phase name
    pub id: PhaseId,
    /// Labels of the staggered children, in declared order
    pub children: Vec<String>,
    /// Effects started on every mount
    pub effects: Vec<Effect>,
}

impl PhaseDef {
    /// Phase with children and no effects.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: PhaseId::new(id),
            children: children.into_iter().map(Into::into).collect(),
            effects: Vec::new(),
        }
    }

    /// Adds an effect.
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Validates every effect and rejects duplicate effect names.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, effect) in self.effects.iter().enumerate() {
            effect.validate()?;
            if self.effects[..i].iter().any(|e| e.name == effect.name) {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.effects", self.id),
                    value: effect.name.clone(),
                    expected: "unique effect names".to_string(),
                });
            }
        }
        Ok(())
    }
}

struct InstanceCell {
    live: bool,
    effects: Vec<EffectState>,
}

/// State and bookkeeping shared with the timer callbacks.
struct Shared {
    phase: PhaseRef,
    names: Vec<String>,
    observer: Arc<dyn StageObserver>,
    cell: Mutex<InstanceCell>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, InstanceCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `update` to effect `slot` if the instance is still live and
    /// notifies the observer. Returns `None` on a dead instance.
    fn update<R>(&self, slot: usize, update: impl FnOnce(&mut EffectState) -> R) -> Option<R> {
        let mut cell = self.lock();
        if !cell.live {
            trace!(mount = %self.phase.mount, "callback after release ignored");
            return None;
        }
        let state = &mut cell.effects[slot];
        let out = update(state);
        self.observer
            .effect_updated(&self.phase, &self.names[slot], state);
        Some(out)
    }
}

/// Point-in-time copy of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    /// Phase name
    pub phase: String,
    /// Position in the phase set
    pub index: usize,
    /// Mount identifier
    pub mount: MountId,
    /// `false` once released
    pub live: bool,
    /// Time since mount
    pub age: Duration,
    /// Time the entrance waits for the previous exit
    pub entrance_delay: Duration,
    /// Effect states by name, in declared order
    pub effects: Vec<(String, EffectState)>,
}

impl InstanceSnapshot {
    /// State of the effect named `name`.
    #[must_use]
    pub fn effect(&self, name: &str) -> Option<&EffectState> {
        self.effects
            .iter()
            .find_map(|(n, s)| (n == name).then_some(s))
    }
}

/// One mounted lifetime of a phase.
pub struct PhaseInstance {
    def: Arc<PhaseDef>,
    shared: Arc<Shared>,
    scope: TaskScope,
    mounted_at: Instant,
    entrance_delay: Duration,
}

impl PhaseInstance {
    /// Mounts `def` and starts its effect timers.
    ///
    /// Effect timings count from the moment the phase becomes visible, that
    /// is `entrance_delay` after mount.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn mount(
        widget: Arc<str>,
        def: Arc<PhaseDef>,
        index: usize,
        mount: MountId,
        entrance_delay: Duration,
        observer: Arc<dyn StageObserver>,
    ) -> Self {
        let phase = PhaseRef {
            widget,
            phase: def.id.to_string(),
            index,
            mount,
        };
        let shared = Arc::new(Shared {
            names: def.effects.iter().map(|e| e.name.clone()).collect(),
            observer,
            cell: Mutex::new(InstanceCell {
                live: true,
                effects: def.effects.iter().map(EffectState::initial).collect(),
            }),
            phase,
        });

        let mut scope = TaskScope::new(format!("{}/{}/{mount}", shared.phase.widget, def.id));
        for (slot, effect) in def.effects.iter().enumerate() {
            start_effect(&mut scope, &shared, slot, effect, entrance_delay);
        }
        debug!(
            widget = %shared.phase.widget,
            phase = %def.id,
            %mount,
            timers = scope.started(),
            "phase mounted"
        );

        Self {
            def,
            shared,
            scope,
            mounted_at: Instant::now(),
            entrance_delay,
        }
    }

    /// The definition this instance was mounted from.
    #[must_use]
    pub fn def(&self) -> &PhaseDef {
        &self.def
    }

    /// Reference used in observer notifications.
    #[must_use]
    pub fn phase_ref(&self) -> &PhaseRef {
        &self.shared.phase
    }

    /// Mount identifier.
    #[must_use]
    pub fn mount_id(&self) -> MountId {
        self.shared.phase.mount
    }

    /// Position in the phase set.
    #[must_use]
    pub fn index(&self) -> usize {
        self.shared.phase.index
    }

    /// When the instance was mounted.
    #[must_use]
    pub const fn mounted_at(&self) -> Instant {
        self.mounted_at
    }

    /// Delay before the entrance starts.
    #[must_use]
    pub const fn entrance_delay(&self) -> Duration {
        self.entrance_delay
    }

    /// Timers that can still fire.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        self.scope.active()
    }

    /// Returns `true` until the instance is released.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.shared.lock().live
    }

    /// Releases the instance: no effect callback mutates state afterwards.
    ///
    /// Idempotent; returns the number of timers that were still pending.
    pub fn release(&mut self) -> usize {
        let mut cell = self.shared.lock();
        if !cell.live {
            return 0;
        }
        cell.live = false;
        let cancelled = self.scope.release();
        drop(cell);
        debug!(mount = %self.shared.phase.mount, cancelled, "phase released");
        cancelled
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> InstanceSnapshot {
        let cell = self.shared.lock();
        InstanceSnapshot {
            phase: self.shared.phase.phase.clone(),
            index: self.shared.phase.index,
            mount: self.shared.phase.mount,
            live: cell.live,
            age: self.mounted_at.elapsed(),
            entrance_delay: self.entrance_delay,
            effects: self
                .shared
                .names
                .iter()
                .cloned()
                .zip(cell.effects.iter().cloned())
                .collect(),
        }
    }
}

impl Drop for PhaseInstance {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PhaseInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseInstance")
            .field("phase", &self.shared.phase)
            .field("entrance_delay", &self.entrance_delay)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

fn start_effect(
    scope: &mut TaskScope,
    shared: &Arc<Shared>,
    slot: usize,
    effect: &Effect,
    offset: Duration,
) {
    match &effect.kind {
        EffectKind::Counter {
            start,
            period,
            step,
            ..
        } => {
            let shared = Arc::clone(shared);
            let step = *step;
            scope.repeating(offset + *start, *period, move || {
                match shared.update(slot, |s| s.counter_step(step)) {
                    Some(false) => ControlFlow::Continue(()),
                    _ => ControlFlow::Break(()),
                }
            });
        }
        EffectKind::Reveal { after, .. } => {
            let shared = Arc::clone(shared);
            scope.once(offset + *after, move || {
                shared.update(slot, EffectState::reveal);
            });
        }
        EffectKind::Typewriter {
            start,
            per_char,
            text,
        } => {
            if text.is_empty() {
                return;
            }
            let shared = Arc::clone(shared);
            scope.repeating(offset + *start, *per_char, move || {
                match shared.update(slot, EffectState::type_next) {
                    Some(false) => ControlFlow::Continue(()),
                    _ => ControlFlow::Break(()),
                }
            });
        }
        EffectKind::Feed {
            first,
            spacing,
            count,
            ..
        } => {
            let mut at = offset + *first;
            for _ in 0..*count {
                let shared = Arc::clone(shared);
                scope.once(at, move || {
                    shared.update(slot, EffectState::feed_push);
                });
                at += *spacing;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::phase::effects::CounterStyle;
    use crate::phase::observer::NoopObserver;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn profile() -> Arc<PhaseDef> {
        Arc::new(
            PhaseDef::new("profile", ["card", "stars", "review"])
                .with_effect(Effect::counter(
                    "stars",
                    Duration::ZERO,
                    ms(300),
                    1,
                    5,
                    CounterStyle::Stars,
                ))
                .with_effect(Effect::reveal("review", ms(2000), "Review"))
                .with_effect(Effect::typewriter("typing", ms(2500), ms(80), "Oi!")),
        )
    }

    fn mount(def: Arc<PhaseDef>, offset: Duration) -> PhaseInstance {
        PhaseInstance::mount(
            Arc::from("test"),
            def,
            0,
            MountId(1),
            offset,
            Arc::new(NoopObserver),
        )
    }

    fn instance_text(instance: &PhaseInstance) -> String {
        instance
            .snapshot()
            .effect("typing")
            .map(|s| s.revealed_text().to_string())
            .unwrap_or_default()
    }

    fn stars(instance: &PhaseInstance) -> EffectState {
        instance.snapshot().effect("stars").cloned().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_star_fill_reaches_five() {
        let instance = mount(profile(), Duration::ZERO);
        assert_eq!(stars(&instance), EffectState::Counter { value: 0, max: 5 });

        tokio::time::sleep(ms(301)).await;
        assert_eq!(stars(&instance), EffectState::Counter { value: 1, max: 5 });

        tokio::time::sleep(ms(1200)).await;
        assert_eq!(stars(&instance), EffectState::Counter { value: 5, max: 5 });

        tokio::time::sleep(ms(5000)).await;
        assert_eq!(stars(&instance), EffectState::Counter { value: 5, max: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_effects_wait_for_entrance_delay() {
        let instance = mount(profile(), ms(400));
        tokio::time::sleep(ms(699)).await;
        assert_eq!(stars(&instance), EffectState::Counter { value: 0, max: 5 });
        tokio::time::sleep(ms(2)).await;
        assert_eq!(stars(&instance), EffectState::Counter { value: 1, max: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_typewriter_and_reveal_complete() {
        let start = tokio::time::Instant::now();
        let instance = mount(profile(), Duration::ZERO);
        tokio::time::sleep_until(start + ms(2001)).await;
        let snap = instance.snapshot();
        assert_eq!(snap.effect("review"), Some(&EffectState::Reveal { shown: true }));
        assert_eq!(instance_text(&instance), "");

        // one character per tick, the first one tick after the start
        for (at, expected) in [(2579, ""), (2581, "O"), (2659, "O"), (2661, "Oi"), (2739, "Oi")] {
            tokio::time::sleep_until(start + ms(at)).await;
            assert_eq!(instance_text(&instance), expected, "at {at}ms");
        }
        tokio::time::sleep_until(start + ms(2741)).await;
        assert_eq!(instance_text(&instance), "Oi!");
        assert_eq!(instance.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_freezes_state() {
        let mut instance = mount(profile(), Duration::ZERO);
        tokio::time::sleep(ms(650)).await;
        assert_eq!(instance.active_timers(), 3);

        assert_eq!(instance.release(), 3);
        assert_eq!(instance.release(), 0);
        assert!(!instance.is_live());

        tokio::time::sleep(ms(10_000)).await;
        let snap = instance.snapshot();
        assert!(!snap.live);
        assert_eq!(snap.effect("stars"), Some(&EffectState::Counter { value: 2, max: 5 }));
        assert_eq!(snap.effect("review"), Some(&EffectState::Reveal { shown: false }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_starts_fresh() {
        let def = profile();
        let mut first = mount(Arc::clone(&def), Duration::ZERO);
        tokio::time::sleep(ms(1000)).await;
        first.release();

        let second = mount(def, Duration::ZERO);
        assert_eq!(stars(&second), EffectState::Counter { value: 0, max: 5 });
        assert_eq!(
            second.snapshot().effect("review"),
            Some(&EffectState::Reveal { shown: false })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_schedule() {
        let def = Arc::new(PhaseDef::new("panel", ["leads"]).with_effect(Effect::feed(
            "leads",
            vec![1],
            ms(1000),
            ms(1200),
            5,
            6,
            "Lead #{id}",
        )));
        let instance = mount(def, Duration::ZERO);

        let ids = |i: &PhaseInstance| match i.snapshot().effect("leads") {
            Some(EffectState::Feed { items, .. }) => items.iter().copied().collect::<Vec<_>>(),
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(ids(&instance), [1]);
        tokio::time::sleep(ms(1001)).await;
        assert_eq!(ids(&instance), [2, 1]);
        tokio::time::sleep(ms(1200 * 4)).await;
        assert_eq!(ids(&instance), [6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_duplicate_effect_names_rejected() {
        let def = PhaseDef::new("p", ["a"])
            .with_effect(Effect::reveal("x", ms(1), "a"))
            .with_effect(Effect::reveal("x", ms(2), "b"));
        assert!(matches!(
            def.validate(),
            Err(ConfigError::InvalidValue { ref value, .. }) if value == "x"
        ));
    }

    #[test]
    fn test_mount_id_display() {
        assert_eq!(MountId(4).to_string(), "mount#4");
    }
}
