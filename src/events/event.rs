//! # Runtime events emitted by the worker and its run loop.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: worker start, stop request, exit, shutdown timeout
//! - **Cycle events**: per-cycle flow (starting, completed, failed, canceled, faulted)
//! - **Housekeeping events**: settings reload failures, reclaim hints, idle reports
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker name,
//! cycle number, reasons and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cyclevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CycleFailed)
//!     .with_worker("leaderboards")
//!     .with_cycle(3)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::CycleFailed);
//! assert_eq!(ev.worker.as_deref(), Some("leaderboards"));
//! assert_eq!(ev.cycle, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::reclaim::ReclaimPhase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `worker`, `subscriber`, `reason` (panic message) and the `cycle`
    /// of the event that was being handled.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `worker`, `subscriber`, `dropped` and `reason` (`full` or `closed`).
    SubscriberOverflow,

    // === Worker lifecycle ===
    /// The loop thread is up and about to enter the run loop.
    WorkerStarting,

    /// `stop` was called (or an OS signal was observed); cancellation raised.
    StopRequested,

    /// The run loop returned and the loop thread is finishing.
    WorkerStopped,

    /// `stop` gave up waiting for the loop.
    ///
    /// Sets `timeout_ms`.
    ShutdownTimeout,

    // === Cycle events ===
    /// A cycle is starting (settings already reloaded).
    ///
    /// Sets `cycle`.
    CycleStarting,

    /// The cycle body returned `Ok`.
    ///
    /// Sets `cycle`, `elapsed_ms`.
    CycleCompleted,

    /// The cycle body observed cancellation and returned `Canceled`.
    ///
    /// Sets `cycle`.
    CycleCanceled,

    /// The cycle body failed (error or panic); the loop continues.
    ///
    /// Sets `cycle`, `reason`.
    CycleFailed,

    /// The cycle body returned a fatal error; the loop exits.
    ///
    /// Sets `cycle`, `reason`.
    CycleFaulted,

    /// Free-form message published by a cycle body through its context.
    ///
    /// Sets `cycle`, `reason`.
    CycleNote,

    // === Housekeeping ===
    /// `Settings::reload` failed; the cycle body was skipped.
    ///
    /// Sets `cycle`, `reason`.
    SettingsReloadFailed,

    /// A memory-reclaim hint was issued.
    ///
    /// Sets `cycle`, `reclaim`.
    ReclaimRequested,

    /// Idle budget left after the active part of a cycle.
    ///
    /// Sets `cycle`, `remaining_ms`.
    IdleRemaining,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker name, if applicable.
    pub worker: Option<Arc<str>>,
    /// Subscriber the event is about (overflow, panic).
    pub subscriber: Option<&'static str>,
    /// Events dropped so far for that subscriber.
    pub dropped: Option<u64>,
    /// Cycle number (starting from 1).
    pub cycle: Option<u64>,
    /// Human-readable reason (errors, notes, overflow details).
    pub reason: Option<Arc<str>>,
    /// Remaining idle budget in milliseconds (compact).
    pub remaining_ms: Option<u64>,
    /// Active time of a cycle body in milliseconds (compact).
    pub elapsed_ms: Option<u64>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u64>,
    /// Which reclaim hint was issued.
    pub reclaim: Option<ReclaimPhase>,
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            subscriber: None,
            dropped: None,
            cycle: None,
            reason: None,
            remaining_ms: None,
            elapsed_ms: None,
            timeout_ms: None,
            reclaim: None,
        }
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the remaining idle budget (stored as milliseconds).
    #[inline]
    pub fn with_remaining(mut self, d: Duration) -> Self {
        self.remaining_ms = Some(millis(d));
        self
    }

    /// Attaches the active time of a cycle (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches a reclaim phase.
    #[inline]
    pub fn with_reclaim(mut self, phase: ReclaimPhase) -> Self {
        self.reclaim = Some(phase);
        self
    }

    /// Names the subscriber the event is about.
    #[inline]
    pub fn with_subscriber(mut self, subscriber: &'static str) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    /// Attaches a per-subscriber drop count.
    #[inline]
    pub fn with_dropped(mut self, dropped: u64) -> Self {
        self.dropped = Some(dropped);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::CycleStarting);
        let b = Event::new(EventKind::CycleCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_stored_as_millis() {
        let ev = Event::new(EventKind::IdleRemaining)
            .with_remaining(Duration::from_secs(119))
            .with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.remaining_ms, Some(119_000));
        assert_eq!(ev.timeout_ms, Some(1500));
    }
}
