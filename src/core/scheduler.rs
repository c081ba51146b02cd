//! # Scheduler: the periodic run loop.
//!
//! Runs cycles strictly one after another until cancellation, a cancellation
//! outcome from the cycle body, or a fatal cycle error.
//!
//! ## Architecture
//! ```text
//! Worker ──► Scheduler::run(token)
//!
//! loop {
//!   ├─► token raised? ─────────────────────────────► exit Ok
//!   ├─► settings.reload()
//!   │       └─ Err ─► publish SettingsReloadFailed
//!   │                 idle = last good budget, else fallback, else 1s
//!   │                 idle.delay(token) ─► next cycle
//!   ├─► idle = Idle::start_new(update_interval)
//!   ├─► publish CycleStarting
//!   ├─► run_cycle(body, token) (contained)
//!   │       ├─ Ok / Fail  ─► continue below
//!   │       ├─ Canceled   ─► exit Ok
//!   │       └─ Fatal      ─► exit Err(Fault)
//!   ├─► reclaim(AfterCycle)
//!   ├─► idle.write_time_remaining()
//!   ├─► remaining > delay_before_gc?
//!   │       └─ yes ─► sleep(delay_before_gc) (cancellable) ─► reclaim(AfterGrace)
//!   └─► idle.delay(token) (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Cycles never overlap: the next reload waits for the previous idle wait
//! - Every wait observes the token and returns as soon as it is raised
//! - `Fail` outcomes and panics are logged once and never end the loop

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_cycle,
    cycle::CycleRef,
    error::{CycleError, RuntimeError},
    events::{Bus, Event, EventKind},
    idle::{Idle, sleep_or_cancel},
    reclaim::{Reclaim, ReclaimPhase},
    settings::{CycleSettings, Settings},
};

/// Wait after a failed reload when neither a previous snapshot nor the
/// configured fallback provides a budget.
pub(crate) const RELOAD_RETRY_FLOOR: Duration = Duration::from_secs(1);

/// Drives the cycle body on a fixed cadence.
///
/// ### Responsibilities
/// - **Settings**: reloads once per cycle; the snapshot is owned for that cycle
/// - **Containment**: ordinary failures are logged, the loop continues
/// - **Idle budgeting**: waits out what the cycle left of its budget
/// - **Reclaim hints**: after every cycle, and again after the grace delay
pub struct Scheduler {
    worker: Arc<str>,
    settings: Arc<dyn Settings>,
    cycle: CycleRef,
    reclaim: Arc<dyn Reclaim>,
    bus: Bus,
    fallback_budget: Option<Duration>,
}

impl Scheduler {
    /// Creates a scheduler.
    ///
    /// `fallback_budget` is the idle budget used after a failed reload when no
    /// earlier snapshot provides one; with `None` a failed reload is retried
    /// after one second.
    pub fn new(
        worker: Arc<str>,
        settings: Arc<dyn Settings>,
        cycle: CycleRef,
        reclaim: Arc<dyn Reclaim>,
        bus: Bus,
        fallback_budget: Option<Duration>,
    ) -> Self {
        Self {
            worker,
            settings,
            cycle,
            reclaim,
            bus,
            fallback_budget,
        }
    }

    /// Runs cycles until `token` is raised or a cycle ends the loop.
    ///
    /// ### Exit conditions
    /// - `token` raised (checked before every cycle and during every wait) → `Ok`
    /// - cycle body returned `Canceled` → `Ok`, no further reload
    /// - cycle body returned `Fatal` → `Err(RuntimeError::Fault)`
    pub async fn run(&self, token: CancellationToken) -> Result<(), RuntimeError> {
        let mut last_good: Option<CycleSettings> = None;
        let mut cycle: u64 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            // Zero-length waits never suspend; let the listener and subscribers run.
            tokio::task::yield_now().await;
            cycle += 1;

            match self.run_one(cycle, &mut last_good, &token).await {
                Ok(()) | Err(CycleError::Fail { .. }) => {}
                Err(CycleError::Canceled) => break,
                Err(CycleError::Fatal { error }) => {
                    return Err(RuntimeError::Fault { cycle, error });
                }
            }
        }
        Ok(())
    }

    /// One full cycle: reload, body, reclaim, grace, idle.
    async fn run_one(
        &self,
        cycle: u64,
        last_good: &mut Option<CycleSettings>,
        token: &CancellationToken,
    ) -> Result<(), CycleError> {
        let settings = match self.settings.reload() {
            Ok(settings) => {
                *last_good = Some(settings);
                settings
            }
            Err(e) => {
                self.bus.publish(
                    self.event(EventKind::SettingsReloadFailed, cycle)
                        .with_reason(e.to_string()),
                );
                let budget = last_good
                    .and_then(|s| s.budget())
                    .or(self.fallback_budget)
                    .unwrap_or(RELOAD_RETRY_FLOOR);
                return Idle::start_new(Some(budget)).delay(token).await;
            }
        };

        let idle = Idle::start_new(settings.update_interval);
        self.bus.publish(self.event(EventKind::CycleStarting, cycle));

        if let Err(e) = run_cycle(self.cycle.as_ref(), token, cycle, &self.worker, &self.bus).await {
            if !e.is_contained() {
                return Err(e);
            }
        }

        self.request_reclaim(cycle, ReclaimPhase::AfterCycle);
        idle.write_time_remaining(&self.bus, &self.worker, cycle);

        if let Some(grace) = settings.grace_for(idle.time_remaining()) {
            sleep_or_cancel(grace, token).await?;
            self.request_reclaim(cycle, ReclaimPhase::AfterGrace);
        }

        idle.delay(token).await
    }

    fn request_reclaim(&self, cycle: u64, phase: ReclaimPhase) {
        self.reclaim.reclaim(phase);
        self.bus.publish(
            self.event(EventKind::ReclaimRequested, cycle)
                .with_reclaim(phase),
        );
    }

    fn event(&self, kind: EventKind, cycle: u64) -> Event {
        Event::new(kind)
            .with_worker(Arc::clone(&self.worker))
            .with_cycle(cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use tokio::sync::broadcast;
    use tokio::time::{self, Instant};

    use crate::cycle::{CycleContext, CycleFn};
    use crate::error::SettingsError;
    use crate::reclaim::ReclaimFn;
    use crate::settings::{SettingsFn, StaticSettings};

    /// Settings that record the instant of every reload.
    fn recording(values: CycleSettings) -> (Arc<dyn Settings>, Arc<Mutex<Vec<Instant>>>) {
        let reloads = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&reloads);
        let settings: Arc<dyn Settings> = SettingsFn::arc(move || {
            seen.lock().unwrap().push(Instant::now());
            Ok(values)
        });
        (settings, reloads)
    }

    /// Body that sleeps `work` on cycles before `stop_at`, then returns `Canceled`.
    fn body(work: Duration, stop_at: u64) -> CycleRef {
        CycleFn::arc("body", move |ctx: CycleContext| async move {
            if ctx.cycle() >= stop_at {
                return Err(CycleError::Canceled);
            }
            time::sleep(work).await;
            Ok(())
        })
    }

    fn scheduler(settings: Arc<dyn Settings>, cycle: CycleRef, bus: &Bus) -> Scheduler {
        Scheduler::new(
            Arc::from("test"),
            settings,
            cycle,
            Arc::new(crate::reclaim::NoReclaim),
            bus.clone(),
            Some(Duration::from_secs(30)),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn count(events: &[Event], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    #[tokio::test(start_paused = true)]
    async fn next_reload_waits_out_the_budget() {
        let bus = Bus::new(64);
        let (settings, reloads) =
            recording(CycleSettings::new(Some(Duration::from_secs(120)), None));
        let sched = scheduler(settings, body(Duration::from_secs(1), 2), &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads.len(), 2);
        assert_eq!(reloads[1] - reloads[0], Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn no_budget_repeats_immediately() {
        let bus = Bus::new(64);
        for interval in [None, Some(Duration::ZERO)] {
            let (settings, reloads) = recording(CycleSettings::new(interval, None));
            let sched = scheduler(settings, body(Duration::ZERO, 3), &bus);

            sched.run(CancellationToken::new()).await.unwrap();

            let reloads = reloads.lock().unwrap();
            assert_eq!(reloads.len(), 3);
            assert_eq!(reloads[2] - reloads[0], Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycle_starts_next_immediately() {
        let bus = Bus::new(64);
        let (settings, reloads) =
            recording(CycleSettings::new(Some(Duration::from_secs(5)), None));
        let sched = scheduler(settings, body(Duration::from_secs(8), 2), &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads[1] - reloads[0], Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_outcome_exits_without_another_reload() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (settings, reloads) =
            recording(CycleSettings::new(Some(Duration::from_secs(60)), None));
        let sched = scheduler(settings, body(Duration::ZERO, 1), &bus);

        let before = Instant::now();
        sched.run(CancellationToken::new()).await.unwrap();

        assert_eq!(reloads.lock().unwrap().len(), 1);
        assert_eq!(before.elapsed(), Duration::ZERO);
        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::CycleCanceled), 1);
        assert_eq!(count(&events, EventKind::ReclaimRequested), 0);
        assert_eq!(count(&events, EventKind::CycleFailed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_logged_once_and_loop_continues() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (settings, reloads) =
            recording(CycleSettings::new(Some(Duration::from_secs(10)), None));
        let cycle = CycleFn::arc("flaky", |ctx: CycleContext| async move {
            match ctx.cycle() {
                1 => Err(CycleError::fail("connection refused")),
                _ => Err(CycleError::Canceled),
            }
        });
        let sched = scheduler(settings, cycle, &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        assert_eq!(reloads.lock().unwrap().len(), 2);
        let events = drain(&mut rx);
        let failed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == EventKind::CycleFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].cycle, Some(1));
        assert_eq!(failed[0].reason.as_deref(), Some("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_body_does_not_end_the_loop() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (settings, reloads) = recording(CycleSettings::default());
        let cycle = CycleFn::arc("panicky", |ctx: CycleContext| async move {
            let n = ctx.cycle();
            assert!(n != 1, "first cycle explodes");
            Err(CycleError::Canceled)
        });
        let sched = scheduler(settings, cycle, &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        assert_eq!(reloads.lock().unwrap().len(), 2);
        assert_eq!(count(&drain(&mut rx), EventKind::CycleFailed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_escapes_the_loop() {
        let bus = Bus::new(64);
        let (settings, reloads) = recording(CycleSettings::default());
        let cycle = CycleFn::arc("broken", |_ctx: CycleContext| async move {
            Err(CycleError::fatal("type initializer failed"))
        });
        let sched = scheduler(settings, cycle, &bus);

        let err = sched.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Fault {
                cycle: 1,
                error: "type initializer failed".into()
            }
        );
        assert_eq!(reloads.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn raised_token_prevents_first_cycle() {
        let bus = Bus::new(64);
        let (settings, reloads) = recording(CycleSettings::default());
        let sched = scheduler(settings, body(Duration::ZERO, u64::MAX), &bus);

        let token = CancellationToken::new();
        token.cancel();
        sched.run(token).await.unwrap();
        assert!(reloads.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_idle_wait() {
        let bus = Bus::new(64);
        let settings = Arc::new(StaticSettings::new(Some(Duration::from_secs(10)), None));
        let sched = scheduler(settings, body(Duration::ZERO, u64::MAX), &bus);

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        let before = Instant::now();
        sched.run(token).await.unwrap();
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }

    /// Runs two cycles with a body taking 1s and returns the reclaim phases seen.
    async fn reclaim_phases(budget: Duration, grace: Duration) -> Vec<ReclaimPhase> {
        let bus = Bus::new(64);
        let phases = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&phases);
        let reclaim = ReclaimFn::arc(move |p: ReclaimPhase| seen.lock().unwrap().push(p));
        let sched = Scheduler::new(
            Arc::from("test"),
            Arc::new(StaticSettings::new(Some(budget), Some(grace))),
            body(Duration::from_secs(1), 2),
            reclaim,
            bus,
            None,
        );
        sched.run(CancellationToken::new()).await.unwrap();
        let phases = phases.lock().unwrap().clone();
        phases
    }

    #[tokio::test(start_paused = true)]
    async fn grace_hint_issued_when_slack_exceeds_threshold() {
        // remaining = 6s - 1s = 5s > 3s
        let phases = reclaim_phases(Duration::from_secs(6), Duration::from_secs(3)).await;
        assert_eq!(phases, vec![ReclaimPhase::AfterCycle, ReclaimPhase::AfterGrace]);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_hint_skipped_when_slack_is_short() {
        // remaining = 2s - 1s = 1s < 3s
        let phases = reclaim_phases(Duration::from_secs(2), Duration::from_secs(3)).await;
        assert_eq!(phases, vec![ReclaimPhase::AfterCycle]);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_wait_does_not_stretch_the_cycle() {
        let bus = Bus::new(64);
        let (settings, reloads) = recording(CycleSettings::new(
            Some(Duration::from_secs(6)),
            Some(Duration::from_secs(3)),
        ));
        let sched = scheduler(settings, body(Duration::from_secs(1), 2), &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads[1] - reloads[0], Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_failure_skips_body_and_uses_fallback_budget() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let calls = Arc::new(AtomicU64::new(0));
        let reloads = Arc::new(Mutex::new(Vec::new()));
        let (c, r) = (Arc::clone(&calls), Arc::clone(&reloads));
        let settings = SettingsFn::arc(move || {
            r.lock().unwrap().push(Instant::now());
            match c.fetch_add(1, Ordering::SeqCst) {
                0 => Err(SettingsError::Reload {
                    error: "config file locked".into(),
                }),
                _ => Ok(CycleSettings::default()),
            }
        });
        let bodies = Arc::new(AtomicU64::new(0));
        let b = Arc::clone(&bodies);
        let cycle = CycleFn::arc("counted", move |_ctx: CycleContext| {
            let b = Arc::clone(&b);
            async move {
                b.fetch_add(1, Ordering::SeqCst);
                Err(CycleError::Canceled)
            }
        });
        let sched = scheduler(settings, cycle, &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        assert_eq!(bodies.load(Ordering::SeqCst), 1);
        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads[1] - reloads[0], Duration::from_secs(30));

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::SettingsReloadFailed), 1);
        assert_eq!(count(&events, EventKind::CycleFailed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_failure_after_success_reuses_last_budget() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let calls = Arc::new(AtomicU64::new(0));
        let reloads = Arc::new(Mutex::new(Vec::new()));
        let (c, r) = (Arc::clone(&calls), Arc::clone(&reloads));
        let settings = SettingsFn::arc(move || {
            r.lock().unwrap().push(Instant::now());
            match c.fetch_add(1, Ordering::SeqCst) {
                1 => Err(SettingsError::Reload {
                    error: "registry unreachable".into(),
                }),
                _ => Ok(CycleSettings::new(Some(Duration::from_secs(10)), None)),
            }
        });
        let bodies = Arc::new(AtomicU64::new(0));
        let b = Arc::clone(&bodies);
        let cycle = CycleFn::arc("counted", move |ctx: CycleContext| {
            let b = Arc::clone(&b);
            async move {
                b.fetch_add(1, Ordering::SeqCst);
                if ctx.cycle() >= 3 {
                    return Err(CycleError::Canceled);
                }
                Ok(())
            }
        });
        let sched = scheduler(settings, cycle, &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        // Cycle 2 is skipped; its wait uses the 10s from cycle 1, not the 30s fallback.
        assert_eq!(bodies.load(Ordering::SeqCst), 2);
        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads.len(), 3);
        assert_eq!(reloads[1] - reloads[0], Duration::from_secs(10));
        assert_eq!(reloads[2] - reloads[1], Duration::from_secs(10));

        let failed: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::SettingsReloadFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].cycle, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_reload_without_any_budget_is_retried_after_floor() {
        let bus = Bus::new(64);
        let reloads = Arc::new(Mutex::new(Vec::new()));
        let r = Arc::clone(&reloads);
        let settings = SettingsFn::arc(move || {
            r.lock().unwrap().push(Instant::now());
            Err(SettingsError::Invalid {
                error: "update interval is not a number".into(),
            })
        });
        let sched = Scheduler::new(
            Arc::from("test"),
            settings,
            body(Duration::ZERO, u64::MAX),
            Arc::new(crate::reclaim::NoReclaim),
            bus,
            None,
        );

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(3500)).await;
            canceller.cancel();
        });
        sched.run(token).await.unwrap();

        let reloads = reloads.lock().unwrap();
        assert_eq!(reloads.len(), 4);
        for pair in reloads.windows(2) {
            assert_eq!(pair[1] - pair[0], RELOAD_RETRY_FLOOR);
        }
    }

    #[tokio::test]
    async fn loop_without_budget_lets_other_tasks_run() {
        use std::sync::atomic::AtomicBool;

        let bus = Bus::new(64);
        let flag = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&flag);
        // Same (current-thread) runtime as the loop: only runs if the loop yields.
        tokio::spawn(async move { setter.store(true, Ordering::SeqCst) });

        let seen = Arc::clone(&flag);
        let cycle = CycleFn::arc("busy", move |_ctx: CycleContext| {
            let seen = Arc::clone(&seen);
            async move {
                if seen.load(Ordering::SeqCst) {
                    return Err(CycleError::Canceled);
                }
                Ok(())
            }
        });
        let sched = scheduler(Arc::new(StaticSettings::new(None, None)), cycle, &bus);

        sched.run(CancellationToken::new()).await.unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_remaining_is_reported_each_cycle() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let settings = Arc::new(StaticSettings::new(Some(Duration::from_secs(120)), None));
        let sched = scheduler(settings, body(Duration::from_secs(1), 2), &bus);

        sched.run(CancellationToken::new()).await.unwrap();

        let reports: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::IdleRemaining)
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].remaining_ms, Some(119_000));
    }
}
