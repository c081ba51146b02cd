//! # Worker run state.
//!
//! ```text
//! NotStarted ──start──► Running ──stop──► StopRequested ──loop exits──► Stopped
//!      │                   │                                              ▲
//!      └──────stop─────────┼──────────────────────────────────────────────┤
//!                          └──────── loop exits on its own (fault) ───────┘
//! ```
//!
//! `Stopped` is terminal; a worker instance never restarts.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a [`Worker`](crate::Worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// Built, `start` not called yet.
    NotStarted = 0,
    /// The loop thread is running cycles.
    Running = 1,
    /// Cancellation raised; waiting for the loop to return.
    StopRequested = 2,
    /// The loop returned (terminal).
    Stopped = 3,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunState::NotStarted,
            1 => RunState::Running,
            2 => RunState::StopRequested,
            _ => RunState::Stopped,
        }
    }

    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::Running => "running",
            RunState::StopRequested => "stop_requested",
            RunState::Stopped => "stopped",
        }
    }
}

/// Atomic cell shared by the control side and the loop thread.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(RunState::NotStarted as u8))
    }

    pub(crate) fn load(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from → to`; returns `false` if the current state is not `from`.
    pub(crate) fn transition(&self, from: RunState, to: RunState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn set_stopped(&self) {
        self.0.store(RunState::Stopped as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_from_expected_state() {
        let cell = StateCell::new();
        assert_eq!(cell.load(), RunState::NotStarted);
        assert!(!cell.transition(RunState::Running, RunState::StopRequested));
        assert!(cell.transition(RunState::NotStarted, RunState::Running));
        assert!(!cell.transition(RunState::NotStarted, RunState::Running));
        assert!(cell.transition(RunState::Running, RunState::StopRequested));
        cell.set_stopped();
        assert_eq!(cell.load(), RunState::Stopped);
        assert_eq!(cell.load().as_label(), "stopped");
    }
}
