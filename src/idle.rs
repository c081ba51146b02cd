//! # Idle-time budgeting for a single cycle.
//!
//! [`Idle`] is stamped when a cycle starts and derives everything else from
//! the clock:
//!
//! ```text
//! elapsed   = now - start
//! remaining = max(0, budget - elapsed)
//! ```
//!
//! Remaining time is recomputed on every call instead of being decremented, so a
//! cycle body that overruns its budget simply yields `remaining = 0`: the tracker
//! never produces a negative wait and the next cycle starts right away.
//!
//! Uses [`tokio::time::Instant`], so paused-clock tests drive it deterministically.

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::CycleError;
use crate::events::{Bus, Event, EventKind};

/// Start instant plus budget of one cycle. Immutable after creation.
#[derive(Debug, Clone, Copy)]
pub struct Idle {
    start: Instant,
    budget: Option<Duration>,
}

impl Idle {
    /// Stamps a tracker with the current instant.
    ///
    /// `None` or a zero budget means "no minimum": remaining time is always zero.
    pub fn start_new(budget: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            budget: budget.filter(|d| !d.is_zero()),
        }
    }

    /// Returns the budget this tracker was created with (`None` if absent or zero).
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Time since the tracker was stamped.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns `max(0, budget - elapsed)`; non-increasing over time.
    pub fn time_remaining(&self) -> Duration {
        match self.budget {
            Some(budget) => budget.saturating_sub(self.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Waits out the remaining budget.
    ///
    /// Returns immediately with `Ok` when nothing remains. If `token` is raised
    /// before or during the wait, returns [`CycleError::Canceled`] without
    /// waiting out the rest.
    pub async fn delay(&self, token: &CancellationToken) -> Result<(), CycleError> {
        if token.is_cancelled() {
            return Err(CycleError::Canceled);
        }
        sleep_or_cancel(self.time_remaining(), token).await
    }

    /// Reports the remaining idle time as an [`EventKind::IdleRemaining`] event.
    pub fn write_time_remaining(&self, bus: &Bus, worker: &str, cycle: u64) {
        bus.publish(
            Event::new(EventKind::IdleRemaining)
                .with_worker(worker)
                .with_cycle(cycle)
                .with_remaining(self.time_remaining()),
        );
    }
}

/// Sleeps for `dur` unless `token` fires first.
///
/// A zero `dur` returns `Ok` without yielding.
pub(crate) async fn sleep_or_cancel(
    dur: Duration,
    token: &CancellationToken,
) -> Result<(), CycleError> {
    if dur.is_zero() {
        return Ok(());
    }
    let sleep = time::sleep(dur);
    tokio::pin!(sleep);
    tokio::select! {
        _ = &mut sleep => Ok(()),
        _ = token.cancelled() => Err(CycleError::Canceled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_is_budget_minus_elapsed() {
        let idle = Idle::start_new(Some(Duration::from_secs(10)));
        assert_eq!(idle.time_remaining(), Duration::from_secs(10));

        time::advance(Duration::from_secs(4)).await;
        assert_eq!(idle.time_remaining(), Duration::from_secs(6));

        time::advance(Duration::from_secs(6)).await;
        assert_eq!(idle.time_remaining(), Duration::ZERO);

        time::advance(Duration::from_secs(30)).await;
        assert_eq!(idle.time_remaining(), Duration::ZERO);
        assert_eq!(idle.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn absent_or_zero_budget_never_waits() {
        let token = CancellationToken::new();
        for budget in [None, Some(Duration::ZERO)] {
            let idle = Idle::start_new(budget);
            assert_eq!(idle.budget(), None);
            assert_eq!(idle.time_remaining(), Duration::ZERO);

            let before = Instant::now();
            idle.delay(&token).await.unwrap();
            assert_eq!(before.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delay_waits_exactly_the_remainder() {
        let token = CancellationToken::new();
        let idle = Idle::start_new(Some(Duration::from_secs(120)));
        time::advance(Duration::from_secs(1)).await;

        let before = Instant::now();
        idle.delay(&token).await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(119));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_with_raised_token_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        let idle = Idle::start_new(Some(Duration::from_secs(10)));

        let before = Instant::now();
        assert_eq!(idle.delay(&token).await, Err(CycleError::Canceled));
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_interrupted_mid_wait() {
        let token = CancellationToken::new();
        let idle = Idle::start_new(Some(Duration::from_secs(10)));

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        let before = Instant::now();
        assert_eq!(idle.delay(&token).await, Err(CycleError::Canceled));
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn write_time_remaining_publishes_report() {
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();
        let idle = Idle::start_new(Some(Duration::from_secs(5)));
        time::advance(Duration::from_secs(2)).await;

        idle.write_time_remaining(&bus, "w", 7);
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::IdleRemaining);
        assert_eq!(ev.cycle, Some(7));
        assert_eq!(ev.remaining_ms, Some(3_000));
    }
}
