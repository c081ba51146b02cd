//! # Memory-reclaim hints.
//!
//! After every cycle the scheduler asks a [`Reclaim`] to release memory the
//! cycle no longer needs. A second hint follows a grace delay when the idle
//! budget leaves enough slack. Without a garbage collector there is usually
//! nothing to do, so the default is [`NoReclaim`]; plug in [`ReclaimFn`] to purge
//! allocator arenas, drop caches, shrink pools and so on.
//!
//! ```rust
//! use std::sync::Arc;
//! use cyclevisor::{Reclaim, ReclaimFn, ReclaimPhase};
//!
//! let hint: Arc<dyn Reclaim> = ReclaimFn::arc(|phase: ReclaimPhase| {
//!     if phase == ReclaimPhase::AfterGrace {
//!         // e.g. purge thread-local caches
//!     }
//! });
//! hint.reclaim(ReclaimPhase::AfterCycle);
//! ```

use std::sync::Arc;

/// Which point of the cycle issued the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimPhase {
    /// Right after the cycle body finished (always issued).
    AfterCycle,
    /// After the grace delay, only when the idle budget exceeded it.
    AfterGrace,
}

/// Memory-reclaim extension point.
///
/// Called synchronously from the loop; keep it short.
pub trait Reclaim: Send + Sync + 'static {
    /// Releases memory eagerly.
    fn reclaim(&self, phase: ReclaimPhase);
}

impl<R: Reclaim + ?Sized> Reclaim for Arc<R> {
    fn reclaim(&self, phase: ReclaimPhase) {
        (**self).reclaim(phase)
    }
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReclaim;

impl Reclaim for NoReclaim {
    fn reclaim(&self, _phase: ReclaimPhase) {}
}

/// Closure-backed [`Reclaim`].
pub struct ReclaimFn<F> {
    f: F,
}

impl<F> ReclaimFn<F>
where
    F: Fn(ReclaimPhase) + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Reclaim for ReclaimFn<F>
where
    F: Fn(ReclaimPhase) + Send + Sync + 'static,
{
    fn reclaim(&self, phase: ReclaimPhase) {
        (self.f)(phase)
    }
}
