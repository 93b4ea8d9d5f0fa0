//! Cancellable timer handles.
//!
//! A [`TimerHandle`] wraps a spawned Tokio task that sleeps and then runs a
//! callback, either once or on a fixed period. Cancellation goes through a
//! [`CancellationToken`] polled with priority over the timer, so a handle
//! that has been cancelled never runs its callback again.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a scheduled timer, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Shared bookkeeping between a handle and its task.
///
/// `settled` flips exactly once, either when the task finishes on its own
/// or when the handle is cancelled; whoever flips it decrements `live`.
#[derive(Debug)]
struct Slot {
    settled: AtomicBool,
    cancelled: AtomicBool,
    live: Option<Arc<AtomicUsize>>,
}

impl Slot {
    fn new(live: Option<Arc<AtomicUsize>>) -> Arc<Self> {
        if let Some(live) = &live {
            live.fetch_add(1, Ordering::SeqCst);
        }
        Arc::new(Self {
            settled: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            live,
        })
    }

    fn settle(&self) -> bool {
        if self.settled.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(live) = &self.live {
            live.fetch_sub(1, Ordering::SeqCst);
        }
        true
    }
}

/// Handle to a one-shot or repeating timer callback.
///
/// Dropping the handle does not cancel the timer; ownership of cancellation
/// belongs to whoever holds it (usually a [`TaskScope`](super::TaskScope)).
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    token: CancellationToken,
    slot: Arc<Slot>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Schedules `callback` to run once after `delay`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn once<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::once_in(delay, CancellationToken::new(), None, callback)
    }

    /// Schedules `callback` every `period`, with the first run at
    /// `start + period`. The timer stops once the callback returns
    /// [`ControlFlow::Break`].
    ///
    /// `period` must be non-zero; callers validate it when building the
    /// effect or driver that owns the timer.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn repeating<F>(start: Duration, period: Duration, callback: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        Self::repeating_in(start, period, CancellationToken::new(), None, callback)
    }

    pub(crate) fn once_in<F>(
        delay: Duration,
        token: CancellationToken,
        live: Option<Arc<AtomicUsize>>,
        callback: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        let slot = Slot::new(live);
        let task_token = token.clone();
        let task_slot = Arc::clone(&slot);
        let deadline = Instant::now() + delay;

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = task_token.cancelled() => {
                    trace!(%id, "one-shot cancelled before firing");
                    return;
                }
                () = tokio::time::sleep_until(deadline) => {}
            }
            if task_token.is_cancelled() {
                return;
            }
            trace!(%id, "one-shot fired");
            callback();
            task_slot.settle();
        });

        Self {
            id,
            token,
            slot,
            task,
        }
    }

    pub(crate) fn repeating_in<F>(
        start: Duration,
        period: Duration,
        token: CancellationToken,
        live: Option<Arc<AtomicUsize>>,
        mut callback: F,
    ) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        let slot = Slot::new(live);
        let task_token = token.clone();
        let task_slot = Arc::clone(&slot);
        let first = Instant::now() + start + period;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => {
                        trace!(%id, "repeating timer cancelled");
                        return;
                    }
                    _ = ticker.tick() => {}
                }
                if task_token.is_cancelled() {
                    return;
                }
                if callback().is_break() {
                    trace!(%id, "repeating timer reached terminal state");
                    break;
                }
            }
            task_slot.settle();
        });

        Self {
            id,
            token,
            slot,
            task,
        }
    }

    /// Returns this timer's identifier.
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }

    /// Cancels the timer.
    ///
    /// Idempotent: returns `true` only for the call that actually cancelled
    /// a still-pending timer. Cancelling twice, or cancelling a one-shot that
    /// already fired, is a no-op that returns `false`.
    pub fn cancel(&self) -> bool {
        if self.slot.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        self.task.abort();
        let pending = self.slot.settle();
        if pending {
            trace!(id = %self.id, "timer cancelled");
        }
        pending
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.slot.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` once the timer can no longer run its callback, either
    /// because it finished or because it was cancelled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.settled.load(Ordering::SeqCst)
    }
}
