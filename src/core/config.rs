//! # Worker configuration.
//!
//! Provides [`WorkerConfig`], the settings of the lifecycle adapter itself.
//! Per-cycle values (budget, grace delay) are not here: they come from
//! [`Settings`](crate::Settings) and are reloaded every cycle.
//!
//! ## Sentinel values
//! - `name = ""` → use the cycle body's name
//! - `fallback_interval = 0s` → a failed reload is retried after one second
//! - `stop_timeout = 0s` → `stop` does not wait for the loop

use std::time::Duration;

/// Configuration of a [`Worker`](crate::Worker).
///
/// ## Field semantics
/// - `name`: worker name (thread name, `worker` field of every event)
/// - `stop_timeout`: how long `stop` waits for the loop to confirm exit
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `fallback_interval`: idle budget used when `Settings::reload` fails and no
///   earlier snapshot had a budget
/// - `listen_for_signals`: also stop on SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows)
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Worker name; empty means "use the cycle body name".
    pub name: String,

    /// Maximum time `stop` blocks waiting for the loop.
    ///
    /// On expiry `stop` returns `RuntimeError::ShutdownTimeout`; the loop thread
    /// keeps finishing in the background.
    pub stop_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Idle budget after a failed settings reload, when no better one is known.
    pub fallback_interval: Duration,

    /// Raise cancellation on OS termination signals (console use).
    pub listen_for_signals: bool,
}

impl WorkerConfig {
    /// Returns the fallback budget as an `Option` (`0s` → `None`).
    #[inline]
    pub fn fallback_budget(&self) -> Option<Duration> {
        if self.fallback_interval.is_zero() {
            None
        } else {
            Some(self.fallback_interval)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the configured name, or `fallback` when it is empty.
    #[inline]
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.name.is_empty() {
            fallback
        } else {
            &self.name
        }
    }
}

impl Default for WorkerConfig {
    /// Default configuration:
    ///
    /// - `name = ""` (cycle body name)
    /// - `stop_timeout = 10s`
    /// - `bus_capacity = 1024`
    /// - `fallback_interval = 30s`
    /// - `listen_for_signals = false`
    fn default() -> Self {
        Self {
            name: String::new(),
            stop_timeout: Duration::from_secs(10),
            bus_capacity: 1024,
            fallback_interval: Duration::from_secs(30),
            listen_for_signals: false,
        }
    }
}
