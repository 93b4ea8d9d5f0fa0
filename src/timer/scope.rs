//! Scoped timer ownership.
//!
//! A [`TaskScope`] is acquired when a phase instance mounts and released
//! when it unmounts. Every timer started through the scope shares a child of
//! the scope's root token, so a single `release` cancels all of them, and
//! dropping the scope releases it as well.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::handle::TimerHandle;

/// Owner of every timer started during one mounted lifetime.
#[derive(Debug)]
pub struct TaskScope {
    label: String,
    root: CancellationToken,
    handles: Vec<TimerHandle>,
    live: Arc<AtomicUsize>,
    released: bool,
}

impl TaskScope {
    /// Creates an empty scope. `label` only appears in logs.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            root: CancellationToken::new(),
            handles: Vec::new(),
            live: Arc::new(AtomicUsize::new(0)),
            released: false,
        }
    }

    /// Starts a one-shot timer owned by this scope.
    ///
    /// Returns `None` if the scope has already been released.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn once<F>(&mut self, delay: Duration, callback: F) -> Option<&TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.released {
            return None;
        }
        let handle = TimerHandle::once_in(
            delay,
            self.root.child_token(),
            Some(Arc::clone(&self.live)),
            callback,
        );
        self.handles.push(handle);
        self.handles.last()
    }

    /// Starts a repeating timer owned by this scope.
    ///
    /// Returns `None` if the scope has already been released.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn repeating<F>(
        &mut self,
        start: Duration,
        period: Duration,
        callback: F,
    ) -> Option<&TimerHandle>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if self.released {
            return None;
        }
        let handle = TimerHandle::repeating_in(
            start,
            period,
            self.root.child_token(),
            Some(Arc::clone(&self.live)),
            callback,
        );
        self.handles.push(handle);
        self.handles.last()
    }

    /// Number of timers that can still fire.
    #[must_use]
    pub fn active(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of timers ever started in this scope.
    #[must_use]
    pub fn started(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` once the scope has been released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Cancels every timer in the scope.
    ///
    /// Idempotent; returns the number of timers that were still pending and
    /// got cancelled by this call.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        self.root.cancel();
        let cancelled = self.handles.iter().filter(|h| h.cancel()).count();
        debug!(scope = %self.label, started = self.handles.len(), cancelled, "scope released");
        cancelled
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.release();
    }
}
