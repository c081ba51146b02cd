//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to diagnostics emitted by the worker, the scheduler,
//! the cycle runner, the idle tracker and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Worker` (start/stop), `Scheduler` (reload, reclaim, idle),
//!   `runner::run_cycle` (cycle outcome), `CycleContext::note`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the worker's listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
