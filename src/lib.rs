//! # cyclevisor
//!
//! **Cyclevisor** is a scaffold for long-running periodic background workers.
//!
//! A worker repeatedly runs a unit of work (a *cycle*) on a fixed cadence: each
//! cycle gets a time budget, and whatever the cycle body leaves of it is spent
//! idle before the next one starts. Ordinary failures are contained and logged,
//! shutdown is cooperative and bounded, and a process supervisor drives the
//! worker through a blocking `start` / `stop` pair.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//!   │  Settings   │     │    Cycle     │     │   Reclaim    │
//!   │ (reloaded   │     │ (user body,  │     │ (memory hint,│
//!   │ every cycle)│     │  cancelable) │     │  optional)   │
//!   └──────┬──────┘     └──────┬───────┘     └──────┬───────┘
//!          ▼                   ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Worker (lifecycle adapter)                                   │
//! │  - start(): spawns the loop thread, returns immediately       │
//! │  - stop():  raises the token, waits up to stop_timeout        │
//! │  - RunState: NotStarted → Running → StopRequested → Stopped   │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                ▼  (dedicated thread, current-thread runtime)
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Scheduler::run(token)                                        │
//! │  reload → Idle::start_new → run_cycle → reclaim → grace → idle│
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ publishes
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast channel)                    │
//! │                (capacity: WorkerConfig::bus_capacity)         │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                ▼
//!                          SubscriberSet
//!                         (per-sub queues)
//!                     ┌──────────┼──────────┐
//!                     ▼          ▼          ▼
//!                 LogWriter    sub2       subN
//! ```
//!
//! ### One cycle
//! ```text
//! t=0        body runs        t=elapsed                      t=budget
//! │◄──────────────────────────►│◄───────── remaining ─────────►│
//! │                            ├─ reclaim(AfterCycle)          │
//! │                            ├─ [grace] if remaining > delay_before_gc:
//! │                            │     sleep(delay_before_gc), reclaim(AfterGrace)
//! │                            └─ idle until t=budget ─────────►│ next cycle
//! ```
//! An overrunning body (`elapsed >= budget`) starts the next cycle immediately.
//! Every wait returns as soon as cancellation is raised.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Lifecycle**     | Supervisor-facing start/stop, console mode, run state.       | [`Worker`], [`WorkerBuilder`], [`RunState`] |
//! | **Cycles**        | Define the work as a trait impl or a closure.                | [`Cycle`], [`CycleFn`], [`CycleContext`]   |
//! | **Settings**      | Per-cycle budget and grace delay, reloaded every cycle.      | [`Settings`], [`CycleSettings`]            |
//! | **Idle tracking** | Budget minus elapsed, never negative, cancellable wait.      | [`Idle`]                                   |
//! | **Reclaim hints** | Eager memory release after cycles.                           | [`Reclaim`], [`ReclaimFn`]                 |
//! | **Subscriber API**| Hook into worker events (logging, metrics, custom sinks).    | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for cycle outcomes and the lifecycle.           | [`CycleError`], [`RuntimeError`]           |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cyclevisor::{
//!     CycleContext, CycleError, CycleFn, LogWriter, StaticSettings, Subscribe, Worker, WorkerConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = WorkerConfig::default();
//!     cfg.stop_timeout = Duration::from_secs(5);
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let worker = Worker::builder(cfg)
//!         .with_settings(StaticSettings::new(
//!             Some(Duration::from_millis(100)),
//!             Some(Duration::from_millis(20)),
//!         ))
//!         .with_cycle(CycleFn::arc("refresh", |ctx: CycleContext| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(CycleError::Canceled);
//!             }
//!             ctx.note(format!("refreshed, cycle {}", ctx.cycle()));
//!             Ok(())
//!         }))
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     worker.start()?;
//!     std::thread::sleep(Duration::from_millis(250));
//!     worker.stop()?;
//!     Ok(())
//! }
//! ```
mod core;
mod cycle;
mod error;
mod events;
mod idle;
mod reclaim;
mod settings;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{RunState, Scheduler, Worker, WorkerBuilder, WorkerConfig, run_cycle};
pub use cycle::{Cycle, CycleContext, CycleFn, CycleRef};
pub use error::{CycleError, RuntimeError, SettingsError};
pub use events::{Bus, Event, EventKind};
pub use idle::Idle;
pub use reclaim::{NoReclaim, Reclaim, ReclaimFn, ReclaimPhase};
pub use settings::{CycleSettings, Settings, SettingsFn, SharedSettings, StaticSettings};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
