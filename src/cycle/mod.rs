//! # Cycle body abstractions.
//!
//! The business logic a worker runs every cycle is injected, not inherited:
//! - [`Cycle`] - trait for async, cancelable cycle bodies
//! - [`CycleFn`] - closure-backed implementation
//! - [`CycleRef`] - shared reference to a cycle body (`Arc<dyn Cycle>`)
//! - [`CycleContext`] - what a body receives each cycle (token, number, diagnostics)

mod body;
mod context;
mod cycle_fn;

pub use body::{Cycle, CycleRef};
pub use context::CycleContext;
pub use cycle_fn::CycleFn;
