//! # Per-cycle context handed to a cycle body.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

/// What a cycle body gets each cycle.
///
/// Cheap to clone; clones share the token and bus.
#[derive(Clone, Debug)]
pub struct CycleContext {
    token: CancellationToken,
    cycle: u64,
    worker: Arc<str>,
    bus: Bus,
}

impl CycleContext {
    pub(crate) fn new(token: CancellationToken, cycle: u64, worker: Arc<str>, bus: Bus) -> Self {
        Self {
            token,
            cycle,
            worker,
            bus,
        }
    }

    /// Child token of the worker's cancellation signal.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shorthand for `token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// 1-based cycle number.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Name of the worker running this cycle.
    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Publishes a free-form diagnostics message ([`EventKind::CycleNote`]).
    pub fn note(&self, msg: impl Into<Arc<str>>) {
        self.bus.publish(
            Event::new(EventKind::CycleNote)
                .with_worker(Arc::clone(&self.worker))
                .with_cycle(self.cycle)
                .with_reason(msg),
        );
    }
}
