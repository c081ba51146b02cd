//! Error types used by the cyclevisor runtime, settings and cycle bodies.
//!
//! This module defines three enums:
//!
//! - [`CycleError`]: outcomes reported by a single cycle body.
//! - [`SettingsError`]: failures while reloading per-cycle settings.
//! - [`RuntimeError`]: errors raised by the worker lifecycle itself.
//!
//! All of them provide `as_label` / `as_message` helpers for logs and metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the worker lifecycle.
///
/// These represent failures of the run loop as a whole, never of a single
/// contained cycle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `start` was called on a worker that already ran (no restart per instance).
    #[error("worker already started")]
    AlreadyStarted,

    /// The builder was missing a required collaborator.
    #[error("worker is incomplete: missing {missing}")]
    Incomplete {
        /// Name of the missing collaborator.
        missing: &'static str,
    },

    /// The dedicated loop thread or its runtime could not be created.
    #[error("failed to spawn worker loop: {error}")]
    Spawn {
        /// The underlying error message.
        error: String,
    },

    /// `stop` gave up waiting; the loop thread may still be finishing.
    #[error("shutdown timeout {timeout:?} exceeded; loop still running")]
    ShutdownTimeout {
        /// The configured stop timeout.
        timeout: Duration,
    },

    /// A cycle body reported a fatal error and the loop exited.
    #[error("cycle {cycle} faulted: {error}")]
    Fault {
        /// Cycle number (1-based) that faulted.
        cycle: u64,
        /// The underlying error message.
        error: String,
    },

    /// The loop thread panicked outside of a cycle body (e.g. in `Settings::reload`).
    #[error("worker loop panicked: {error}")]
    LoopPanicked {
        /// The panic message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimeout { timeout: Duration::from_secs(10) };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Incomplete { .. } => "runtime_incomplete",
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::ShutdownTimeout { .. } => "runtime_shutdown_timeout",
            RuntimeError::Fault { .. } => "runtime_fault",
            RuntimeError::LoopPanicked { .. } => "runtime_loop_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::AlreadyStarted => "already started".to_string(),
            RuntimeError::Incomplete { missing } => format!("missing: {missing}"),
            RuntimeError::Spawn { error } => format!("spawn: {error}"),
            RuntimeError::ShutdownTimeout { timeout } => {
                format!("loop did not exit within {timeout:?}")
            }
            RuntimeError::Fault { cycle, error } => format!("fault in cycle {cycle}: {error}"),
            RuntimeError::LoopPanicked { error } => format!("loop panicked: {error}"),
        }
    }
}

/// # Outcomes of a cycle body.
///
/// `Fail` is contained by the scheduler (logged, next cycle runs);
/// `Canceled` ends the loop gracefully; `Fatal` escapes the loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// Ordinary runtime failure; the loop proceeds to the next cycle.
    #[error("cycle failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Broken program construction (not a transient condition); ends the loop.
    #[error("fatal error (loop exits): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Cancellation was observed; the loop exits without further steps.
    #[error("context cancelled")]
    Canceled,
}

impl CycleError {
    /// Shorthand for [`CycleError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        CycleError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`CycleError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        CycleError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::CycleError;
    ///
    /// assert_eq!(CycleError::Canceled.as_label(), "cycle_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CycleError::Fail { .. } => "cycle_failed",
            CycleError::Fatal { .. } => "cycle_fatal",
            CycleError::Canceled => "cycle_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CycleError::Fail { error } => format!("error: {error}"),
            CycleError::Fatal { error } => format!("fatal: {error}"),
            CycleError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the scheduler swallows this outcome and keeps looping.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::CycleError;
    ///
    /// assert!(CycleError::fail("db unavailable").is_contained());
    /// assert!(!CycleError::fatal("bad wiring").is_contained());
    /// assert!(!CycleError::Canceled.is_contained());
    /// ```
    pub fn is_contained(&self) -> bool {
        matches!(self, CycleError::Fail { .. })
    }
}

/// Lets cycle bodies use `?` on boxed errors; they become contained failures.
impl From<Box<dyn std::error::Error + Send + Sync + 'static>> for CycleError {
    fn from(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        CycleError::Fail {
            error: err.to_string(),
        }
    }
}

/// # Errors produced while reloading settings.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The backing store could not be read.
    #[error("settings reload failed: {error}")]
    Reload {
        /// The underlying error message.
        error: String,
    },

    /// The backing store returned values that cannot be used.
    #[error("invalid settings: {error}")]
    Invalid {
        /// The underlying error message.
        error: String,
    },
}

impl SettingsError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Reload { .. } => "settings_reload_failed",
            SettingsError::Invalid { .. } => "settings_invalid",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SettingsError::Reload { error } => format!("reload: {error}"),
            SettingsError::Invalid { error } => format!("invalid: {error}"),
        }
    }
}
