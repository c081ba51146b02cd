//! Runtime core: cycle scheduling and worker lifecycle.
//!
//! Internal modules:
//! - [`runner`]: executes one cycle body with cancellation, panic containment and event publishing;
//! - [`scheduler`]: the reload → run → reclaim → grace → idle loop;
//! - [`worker`]: lifecycle adapter (`start` / `stop`) running the loop on its own thread;
//! - [`builder`]: assembles a worker from its collaborators;
//! - [`state`]: run state machine;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod runner;
mod scheduler;
mod shutdown;
mod state;
mod worker;

pub use builder::WorkerBuilder;
pub use config::WorkerConfig;
pub use runner::run_cycle;
pub use scheduler::Scheduler;
pub use state::RunState;
pub use worker::Worker;
