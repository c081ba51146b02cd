//! # Cycle body trait.
//!
//! A cycle body receives a [`CycleContext`] and should check its cancellation
//! token at convenient points, returning [`CycleError::Canceled`] when asked to
//! stop. Cancellation is cooperative: a body that never looks at the token
//! delays shutdown until `Worker::stop` gives up.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cycle::CycleContext;
use crate::error::CycleError;

/// # Asynchronous, cancelable unit of work run once per cycle.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use cyclevisor::{Cycle, CycleContext, CycleError};
///
/// struct Sweep;
///
/// #[async_trait]
/// impl Cycle for Sweep {
///     fn name(&self) -> &str { "sweep" }
///
///     async fn run(&self, ctx: CycleContext) -> Result<(), CycleError> {
///         for batch in 0..3 {
///             if ctx.is_cancelled() {
///                 return Err(CycleError::Canceled);
///             }
///             ctx.note(format!("swept batch {batch}"));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    /// Returns a stable, human-readable name (used as the worker thread name).
    fn name(&self) -> &str;

    /// Executes one cycle.
    ///
    /// - `Ok(())`: done, the loop idles and repeats
    /// - `Err(Fail)`: logged, the loop idles and repeats
    /// - `Err(Canceled)`: the loop exits
    /// - `Err(Fatal)`: the loop exits and the fault is reported to the supervisor
    async fn run(&self, ctx: CycleContext) -> Result<(), CycleError>;
}

/// Shared handle to a cycle body.
pub type CycleRef = Arc<dyn Cycle>;
