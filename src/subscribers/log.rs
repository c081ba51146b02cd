//! # LogWriter: events to `tracing`
//!
//! Maps incoming [`Event`]s to structured `tracing` records. Installing a
//! `tracing` subscriber (formatter, filter, sink) is left to the application.
//!
//! ## Levels
//! - `error`: cycle failures, faults, settings reload failures, subscriber panics
//! - `warn`: shutdown timeout, subscriber overflow
//! - `info`: worker start/stop, stop requests, cycle notes
//! - `debug`: per-cycle progress, idle reports, reclaim hints

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let worker = e.worker.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WorkerStarting => info!(worker, "worker starting"),
            EventKind::StopRequested => info!(worker, reason, "stopping service..."),
            EventKind::WorkerStopped => info!(worker, "worker stopped"),
            EventKind::ShutdownTimeout => {
                warn!(worker, timeout_ms = ?e.timeout_ms, "loop did not exit before stop timeout")
            }
            EventKind::CycleStarting => debug!(worker, cycle = ?e.cycle, "cycle starting"),
            EventKind::CycleCompleted => {
                debug!(worker, cycle = ?e.cycle, elapsed_ms = ?e.elapsed_ms, "cycle completed")
            }
            EventKind::CycleCanceled => debug!(worker, cycle = ?e.cycle, "cycle canceled"),
            EventKind::CycleFailed => {
                error!(worker, cycle = ?e.cycle, error = reason, "failed to complete run due to an error")
            }
            EventKind::CycleFaulted => {
                error!(worker, cycle = ?e.cycle, error = reason, "cycle faulted; run loop exits")
            }
            EventKind::CycleNote => info!(worker, cycle = ?e.cycle, "{reason}"),
            EventKind::SettingsReloadFailed => {
                error!(worker, cycle = ?e.cycle, error = reason, "failed to reload settings; cycle skipped")
            }
            EventKind::ReclaimRequested => {
                debug!(worker, cycle = ?e.cycle, phase = ?e.reclaim, "memory reclaim requested")
            }
            EventKind::IdleRemaining => {
                debug!(worker, cycle = ?e.cycle, remaining_ms = ?e.remaining_ms, "idle time remaining")
            }
            EventKind::SubscriberOverflow => warn!(
                worker,
                subscriber = e.subscriber.unwrap_or("-"),
                dropped = ?e.dropped,
                queue = reason,
                "subscriber dropped an event"
            ),
            EventKind::SubscriberPanicked => error!(
                worker,
                subscriber = e.subscriber.unwrap_or("-"),
                cycle = ?e.cycle,
                info = reason,
                "subscriber panicked"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
