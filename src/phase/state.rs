//! Cycle state representation
//!
//! The current phase index of a running driver, plus the records handed to
//! listeners whenever that index moves.

use std::time::Duration;

use tokio::time::Instant;

/// Current position of a cycle driver.
///
/// Created at index 0 when the driver starts. Only the driver's tick
/// mutates it, wrapping to 0 after the last index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    current_index: usize,
    phase_count: usize,
    ticks: u64,
}

impl CycleState {
    /// Creates a state positioned on the first phase.
    ///
    /// `phase_count` is validated by the driver before any state exists.
    #[must_use]
    pub const fn new(phase_count: usize) -> Self {
        Self {
            current_index: 0,
            phase_count,
            ticks: 0,
        }
    }

    /// Returns the current phase index.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns the number of phases being cycled.
    #[must_use]
    pub const fn phase_count(&self) -> usize {
        self.phase_count
    }

    /// Returns how many advances have happened since the state was created.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Moves to the next index, wrapping after the last one, and returns it.
    pub const fn advance(&mut self) -> usize {
        self.current_index = (self.current_index + 1) % self.phase_count;
        self.ticks += 1;
        self.current_index
    }
}

/// One advance of a cycle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTick {
    /// Index the driver moved from
    pub from_index: usize,
    /// Index the driver moved to
    pub to_index: usize,
    /// Number of advances since the driver started, this one included
    pub tick: u64,
    /// When the advance fired
    pub at: Instant,
}

/// Record of a stage moving from one mounted phase to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase index we transitioned from (`None` on first mount)
    pub from_phase: Option<usize>,
    /// Phase index we transitioned to
    pub to_phase: usize,
    /// Mount that was released
    pub released_mount: Option<super::MountId>,
    /// Mount that was created
    pub mounted: super::MountId,
    /// Timers of the outgoing mount that were still pending when it was released
    pub cancelled_timers: usize,
    /// How long the incoming phase waits for the outgoing exit to finish
    pub entrance_delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_zero() {
        let state = CycleState::new(3);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.phase_count(), 3);
        assert_eq!(state.ticks(), 0);
    }

    #[test]
    fn test_advance_wraps() {
        let mut state = CycleState::new(3);
        let seen: Vec<usize> = (0..7).map(|_| state.advance()).collect();
        assert_eq!(seen, [1, 2, 0, 1, 2, 0, 1]);
        assert_eq!(state.ticks(), 7);
    }

    #[test]
    fn test_two_phase_alternates() {
        let mut state = CycleState::new(2);
        assert_eq!(state.advance(), 1);
        assert_eq!(state.advance(), 0);
        assert_eq!(state.advance(), 1);
    }
}
