//! Cycle driver
//!
//! A repeating timer that advances a phase index modulo the phase count.
//! The index starts at 0 the moment the driver starts; the first advance
//! happens one full interval later.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::timer::TimerHandle;

use super::state::{CycleState, PhaseTick};

type AdvanceFn = Arc<dyn Fn(PhaseTick) + Send + Sync>;

/// Shared between the driver and its timer task.
///
/// `epoch` changes every time the schedule is (re)started or stopped. A tick
/// belonging to an older epoch is discarded under the lock, so once `stop`
/// or `set_interval` returns no stale advance can run.
struct Inner {
    state: CycleState,
    epoch: u64,
    running: bool,
}

/// Periodic phase-index driver.
pub struct CycleDriver {
    phase_count: usize,
    interval: Duration,
    inner: Arc<Mutex<Inner>>,
    timer: Option<TimerHandle>,
    on_advance: Option<AdvanceFn>,
}

impl CycleDriver {
    /// Creates a stopped driver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroPhaseCount`] if `phase_count` is zero and
    /// [`ConfigError::NonPositiveInterval`] if `interval` is zero.
    pub fn new(phase_count: usize, interval: Duration) -> Result<Self, ConfigError> {
        if phase_count == 0 {
            return Err(ConfigError::ZeroPhaseCount);
        }
        check_interval(interval)?;

        Ok(Self {
            phase_count,
            interval,
            inner: Arc::new(Mutex::new(Inner {
                state: CycleState::new(phase_count),
                epoch: 0,
                running: false,
            })),
            timer: None,
            on_advance: None,
        })
    }

    /// Starts cycling from index 0, calling `on_advance` on every advance.
    ///
    /// The callback runs while the driver's lock is held, so it is serialized
    /// with [`stop`](Self::stop) and [`set_interval`](Self::set_interval).
    /// Calling `start` on a running driver restarts it from index 0.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start<F>(&mut self, on_advance: F)
    where
        F: Fn(PhaseTick) + Send + Sync + 'static,
    {
        self.cancel_timer();
        {
            let mut inner = lock(&self.inner);
            inner.state = CycleState::new(self.phase_count);
            inner.running = true;
            inner.epoch += 1;
        }
        self.on_advance = Some(Arc::new(on_advance));
        self.schedule();
        debug!(
            phase_count = self.phase_count,
            interval_ms = millis(self.interval),
            "cycle driver started"
        );
    }

    /// Changes the interval.
    ///
    /// On a running driver the periodic schedule restarts: the next advance
    /// happens one new interval from now, the current index is kept, and the
    /// old timer is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveInterval`] if `interval` is zero;
    /// the driver keeps its previous schedule in that case.
    pub fn set_interval(&mut self, interval: Duration) -> Result<(), ConfigError> {
        check_interval(interval)?;
        self.interval = interval;

        if self.is_running() {
            self.cancel_timer();
            lock(&self.inner).epoch += 1;
            self.schedule();
            debug!(interval_ms = millis(interval), "cycle driver rescheduled");
        }
        Ok(())
    }

    /// Stops the driver and releases its timer. Idempotent.
    ///
    /// Returns `true` if the driver was running.
    pub fn stop(&mut self) -> bool {
        let was_running = {
            let mut inner = lock(&self.inner);
            let was_running = inner.running;
            inner.running = false;
            inner.epoch += 1;
            was_running
        };
        self.cancel_timer();
        self.on_advance = None;
        if was_running {
            debug!("cycle driver stopped");
        }
        was_running
    }

    /// Returns the current phase index.
    #[must_use]
    pub fn current_index(&self) -> usize {
        lock(&self.inner).state.current_index()
    }

    /// Returns a copy of the current cycle state.
    #[must_use]
    pub fn state(&self) -> CycleState {
        lock(&self.inner).state
    }

    /// Returns `true` while the driver is cycling.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner).running
    }

    /// Returns the configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of phases being cycled.
    #[must_use]
    pub const fn phase_count(&self) -> usize {
        self.phase_count
    }

    fn schedule(&mut self) {
        let Some(on_advance) = self.on_advance.clone() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        let epoch = lock(&inner).epoch;

        let handle = TimerHandle::repeating(Duration::ZERO, self.interval, move || {
            let mut guard = lock(&inner);
            if !guard.running || guard.epoch != epoch {
                trace!(epoch, "discarding stale driver tick");
                return std::ops::ControlFlow::Break(());
            }
            let from_index = guard.state.current_index();
            let to_index = guard.state.advance();
            let tick = PhaseTick {
                from_index,
                to_index,
                tick: guard.state.ticks(),
                at: Instant::now(),
            };
            trace!(from_index, to_index, tick = tick.tick, "cycle advance");
            on_advance(tick);
            drop(guard);
            std::ops::ControlFlow::Continue(())
        });
        self.timer = Some(handle);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Drop for CycleDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CycleDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleDriver")
            .field("phase_count", &self.phase_count)
            .field("interval", &self.interval)
            .field("current_index", &self.current_index())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn check_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        return Err(ConfigError::NonPositiveInterval {
            field: "cycle_interval".to_string(),
            value: interval,
        });
    }
    Ok(())
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
