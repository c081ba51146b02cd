//! # Worker: lifecycle adapter for a process supervisor.
//!
//! [`Worker`] exposes the blocking `start` / `stop` pair a service host
//! expects, and runs the [`Scheduler`] on a dedicated OS thread that owns a
//! current-thread tokio runtime.
//!
//! ## Architecture
//! ```text
//! control thread                         loop thread ("<worker name>")
//! ──────────────                         ─────────────────────────────
//! start() ──spawn──────────────────────► runtime.block_on:
//!   (returns immediately)                  ├─► listener: Bus ─► SubscriberSet
//!                                          ├─► signal watcher (optional)
//!                                          ├─► publish WorkerStarting
//!                                          ├─► Scheduler::run(token)
//!                                          ├─► publish WorkerStopped
//!                                          └─► drain subscribers
//! stop()                                 state = Stopped
//!   ├─► publish StopRequested            exit.finish(outcome) ──┐
//!   ├─► token.cancel() ──────────────►   (observed at next       │
//!   └─► exit.wait(stop_timeout) ◄────     suspension point)      │
//!         ├─ outcome ◄───────────────────────────────────────────┘
//!         └─ timeout ─► publish ShutdownTimeout, Err(ShutdownTimeout)
//! ```
//!
//! ## Rules
//! - The token is the only state the loop shares with the control side besides
//!   the run state and the exit slot
//! - `stop` is idempotent and safe to call from any thread, concurrently with the loop
//! - A timed-out `stop` does not escalate: the loop thread keeps finishing

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::WorkerBuilder,
        config::WorkerConfig,
        scheduler::Scheduler,
        shutdown,
        state::{RunState, StateCell},
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet, panic_message},
};

/// Everything the loop thread takes ownership of at `start`.
pub(crate) struct LoopParts {
    pub(crate) scheduler: Scheduler,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
}

/// Outcome slot the loop thread fills exactly once.
struct Exit {
    outcome: Mutex<Option<Result<(), RuntimeError>>>,
    done: Condvar,
}

impl Exit {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn finish(&self, outcome: Result<(), RuntimeError>) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.done.notify_all();
    }

    /// Blocks until the outcome is set, or `timeout` elapses (`None` = forever).
    fn wait(&self, timeout: Option<Duration>) -> Option<Result<(), RuntimeError>> {
        let slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match timeout {
            Some(t) => {
                self.done
                    .wait_timeout_while(slot, t, |o| o.is_none())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .done
                .wait_while(slot, |o| o.is_none())
                .unwrap_or_else(PoisonError::into_inner),
        };
        slot.clone()
    }
}

/// A long-running periodic worker with supervisor-facing start/stop.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use cyclevisor::{CycleContext, CycleError, CycleFn, StaticSettings, Worker, WorkerConfig};
///
/// let mut cfg = WorkerConfig::default();
/// cfg.stop_timeout = Duration::from_secs(2);
///
/// let worker = Worker::builder(cfg)
///     .with_settings(StaticSettings::new(Some(Duration::from_millis(50)), None))
///     .with_cycle(CycleFn::arc("tick", |ctx: CycleContext| async move {
///         if ctx.is_cancelled() {
///             return Err(CycleError::Canceled);
///         }
///         Ok(())
///     }))
///     .build()
///     .expect("complete worker");
///
/// worker.start().expect("started");
/// std::thread::sleep(Duration::from_millis(120));
/// worker.stop().expect("stopped in time");
/// ```
pub struct Worker {
    name: Arc<str>,
    cfg: WorkerConfig,
    bus: Bus,
    token: CancellationToken,
    state: Arc<StateCell>,
    exit: Arc<Exit>,
    parts: Mutex<Option<LoopParts>>,
}

impl Worker {
    /// Starts building a worker with the given configuration.
    pub fn builder(cfg: WorkerConfig) -> WorkerBuilder {
        WorkerBuilder::new(cfg)
    }

    pub(crate) fn from_parts(name: Arc<str>, cfg: WorkerConfig, bus: Bus, parts: LoopParts) -> Self {
        Self {
            name,
            cfg,
            bus,
            token: CancellationToken::new(),
            state: Arc::new(StateCell::new()),
            exit: Arc::new(Exit::new()),
            parts: Mutex::new(Some(parts)),
        }
    }

    /// Worker name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state.load()
    }

    /// Clone of the worker's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Event bus; subscribe here for raw diagnostics.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Launches the run loop on its own thread and returns immediately.
    ///
    /// Fails with `AlreadyStarted` on any call after the first one (including
    /// after `stop`), or with `Spawn` if the thread/runtime cannot be created.
    pub fn start(&self) -> Result<(), RuntimeError> {
        if !self.state.transition(RunState::NotStarted, RunState::Running) {
            return Err(RuntimeError::AlreadyStarted);
        }
        let parts = self
            .parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;

        match self.spawn_loop(parts) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state.set_stopped();
                self.exit.finish(Err(e.clone()));
                Err(e)
            }
        }
    }

    fn spawn_loop(&self, parts: LoopParts) -> Result<(), RuntimeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RuntimeError::Spawn {
                error: e.to_string(),
            })?;

        let name = Arc::clone(&self.name);
        let bus = self.bus.clone();
        let token = self.token.clone();
        let state = Arc::clone(&self.state);
        let exit = Arc::clone(&self.exit);
        let signals = self.cfg.listen_for_signals;

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    runtime.block_on(drive(parts, &name, &bus, &token, &state, signals))
                }))
                .unwrap_or_else(|panic_err| {
                    token.cancel();
                    Err(RuntimeError::LoopPanicked {
                        error: panic_message(&*panic_err),
                    })
                });
                state.set_stopped();
                exit.finish(outcome);
            })
            .map(|_detached| ())
            .map_err(|e| RuntimeError::Spawn {
                error: e.to_string(),
            })
    }

    /// Raises cancellation and blocks until the loop exits or `stop_timeout` elapses.
    ///
    /// ### Returns
    /// - `Ok(())` once the loop confirmed exit (or if it never started)
    /// - `Err(ShutdownTimeout)` if the bound elapsed first; the loop keeps finishing
    /// - the loop's own error if it already ended with a fault
    pub fn stop(&self) -> Result<(), RuntimeError> {
        if self.state.transition(RunState::NotStarted, RunState::Stopped) {
            self.token.cancel();
            self.exit.finish(Ok(()));
            return Ok(());
        }
        if self.state.transition(RunState::Running, RunState::StopRequested) {
            self.bus.publish(self.event(EventKind::StopRequested));
        }
        self.token.cancel();

        let timeout = self.cfg.stop_timeout;
        match self.exit.wait(Some(timeout)) {
            Some(outcome) => outcome,
            None => {
                self.bus
                    .publish(self.event(EventKind::ShutdownTimeout).with_timeout(timeout));
                Err(RuntimeError::ShutdownTimeout { timeout })
            }
        }
    }

    /// Blocks until the loop exits on its own (fault, cancellation outcome,
    /// signal) or through `stop` from another thread.
    ///
    /// Returns `Ok(())` immediately if the worker was never started.
    pub fn wait(&self) -> Result<(), RuntimeError> {
        if self.state.load() == RunState::NotStarted {
            return Ok(());
        }
        self.exit.wait(None).unwrap_or(Ok(()))
    }

    /// Console variant: `start`, then block until the loop terminates.
    ///
    /// Combine with `WorkerConfig::listen_for_signals` to stop on Ctrl-C.
    pub fn run_console(&self) -> Result<(), RuntimeError> {
        self.start()?;
        self.wait()
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_worker(Arc::clone(&self.name))
    }
}

impl Drop for Worker {
    /// Raises cancellation so a detached loop thread winds down; does not wait.
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Body of the loop thread.
async fn drive(
    parts: LoopParts,
    name: &Arc<str>,
    bus: &Bus,
    token: &CancellationToken,
    state: &Arc<StateCell>,
    signals: bool,
) -> Result<(), RuntimeError> {
    let LoopParts {
        scheduler,
        subscribers,
    } = parts;

    let rx = bus.subscribe();
    let set = SubscriberSet::new(Arc::clone(name), subscribers, bus.clone());
    let listener = tokio::spawn(forward(rx, set));

    if signals {
        tokio::spawn(watch_signals(
            Arc::clone(name),
            bus.clone(),
            token.clone(),
            Arc::clone(state),
        ));
    }

    bus.publish(Event::new(EventKind::WorkerStarting).with_worker(Arc::clone(name)));
    let result = scheduler.run(token.clone()).await;

    // The loop may have ended without a stop request; release the signal watcher.
    token.cancel();
    bus.publish(Event::new(EventKind::WorkerStopped).with_worker(Arc::clone(name)));

    if let Ok(set) = listener.await {
        set.shutdown().await;
    }
    result
}

/// Forwards bus events to the subscriber set until `WorkerStopped` passes through.
async fn forward(mut rx: broadcast::Receiver<Event>, set: SubscriberSet) -> SubscriberSet {
    loop {
        match rx.recv().await {
            Ok(ev) => {
                set.emit(&ev);
                if ev.kind == EventKind::WorkerStopped {
                    break;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
    set
}

/// Raises cancellation on an OS termination signal.
async fn watch_signals(name: Arc<str>, bus: Bus, token: CancellationToken, state: Arc<StateCell>) {
    tokio::select! {
        res = shutdown::wait_for_shutdown_signal() => match res {
            Ok(signal) => {
                if state.transition(RunState::Running, RunState::StopRequested) {
                    bus.publish(
                        Event::new(EventKind::StopRequested)
                            .with_worker(name)
                            .with_reason(signal.as_label()),
                    );
                }
                token.cancel();
            }
            Err(e) => tracing::warn!(worker = %name, error = %e, "cannot listen for shutdown signals"),
        },
        _ = token.cancelled() => {}
    }
}
