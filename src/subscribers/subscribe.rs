//! # Subscriber trait: the worker's diagnostics sink.
//!
//! Everything the worker wants to report (idle-time remaining, contained cycle
//! failures, reload problems, lifecycle messages) arrives at [`Subscribe`]
//! implementations as [`Event`]s. Each one is fed from its own bounded queue
//! inside [`SubscriberSet`](crate::SubscriberSet).
//!
//! A slow sink never delays the cycle loop: when its queue is full, the event
//! is dropped for that sink and `SubscriberOverflow` is published instead.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use cyclevisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::CycleFailed | EventKind::SettingsReloadFailed) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of worker events.
///
/// Runs on the loop thread's runtime, one task per subscriber; avoid blocking
/// calls in `on_event`.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue size for this subscriber; events beyond it are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
