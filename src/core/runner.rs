//! # Run a single cycle body with containment.
//!
//! Executes one invocation of a [`Cycle`] and publishes exactly one terminal
//! event for it.
//!
//! ## Event flow
//!
//! ```text
//! Success:       cycle.run() → Ok(())         → CycleCompleted
//! Cancellation:  cycle.run() → Err(Canceled)  → CycleCanceled
//! Failure:       cycle.run() → Err(Fail)      → CycleFailed
//!                cycle.run() → panic          → CycleFailed ("panicked: ...")
//! Fault:         cycle.run() → Err(Fatal)     → CycleFaulted
//! ```
//!
//! ## Rules
//! - Derives a **child token** per cycle; cancelling it never affects the parent
//! - A panic is converted into `CycleError::Fail`, so it is contained like any failure

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    cycle::{Cycle, CycleContext},
    error::CycleError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
};

/// Runs `cycle` once and returns its (panic-normalized) outcome.
pub async fn run_cycle<C: Cycle + ?Sized>(
    cycle: &C,
    parent: &CancellationToken,
    number: u64,
    worker: &Arc<str>,
    bus: &Bus,
) -> Result<(), CycleError> {
    let ctx = CycleContext::new(parent.child_token(), number, Arc::clone(worker), bus.clone());
    let started = Instant::now();

    let res = match AssertUnwindSafe(cycle.run(ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => Err(CycleError::fail(format!(
            "panicked: {}",
            panic_message(&*panic_err)
        ))),
    };

    let base = |kind| {
        Event::new(kind)
            .with_worker(Arc::clone(worker))
            .with_cycle(number)
    };
    match &res {
        Ok(()) => bus.publish(base(EventKind::CycleCompleted).with_elapsed(started.elapsed())),
        Err(CycleError::Canceled) => bus.publish(base(EventKind::CycleCanceled)),
        Err(CycleError::Fail { error }) => {
            bus.publish(base(EventKind::CycleFailed).with_reason(error.as_str()))
        }
        Err(CycleError::Fatal { error }) => {
            bus.publish(base(EventKind::CycleFaulted).with_reason(error.as_str()))
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleFn;

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn panic_is_contained_as_failure() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        fn explode() -> Result<(), CycleError> {
            panic!("index out of range")
        }
        let body = CycleFn::new("boom", |_ctx: CycleContext| async move { explode() });

        let res = run_cycle(&body, &CancellationToken::new(), 1, &Arc::from("w"), &bus).await;
        assert_eq!(res, Err(CycleError::fail("panicked: index out of range")));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CycleFailed);
    }

    #[tokio::test]
    async fn child_token_does_not_cancel_parent() {
        let bus = Bus::new(8);
        let parent = CancellationToken::new();
        let body = CycleFn::new("self-cancel", |ctx: CycleContext| async move {
            ctx.token().cancel();
            Err(CycleError::Canceled)
        });

        let res = run_cycle(&body, &parent, 1, &Arc::from("w"), &bus).await;
        assert_eq!(res, Err(CycleError::Canceled));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn fatal_publishes_fault() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let body = CycleFn::new("broken", |_ctx: CycleContext| async move {
            Err(CycleError::fatal("missing connection string"))
        });

        let res = run_cycle(&body, &CancellationToken::new(), 4, &Arc::from("w"), &bus).await;
        assert!(matches!(res, Err(CycleError::Fatal { .. })));

        let events = drain(&mut rx);
        assert_eq!(events[0].kind, EventKind::CycleFaulted);
        assert_eq!(events[0].cycle, Some(4));
        assert_eq!(events[0].reason.as_deref(), Some("missing connection string"));
    }
}
