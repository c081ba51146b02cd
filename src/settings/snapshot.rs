//! # Settings contract and snapshot.

use std::sync::Arc;
use std::time::Duration;

use crate::error::SettingsError;

/// Values that drive one cycle.
///
/// ## Field semantics
/// - `update_interval`: minimum time a cycle plus its idle tail should occupy
///   (`None` or zero = repeat immediately)
/// - `delay_before_gc`: idle slack required before a second reclaim hint
///   (`None` = never issue the second hint)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSettings {
    /// The cycle budget.
    pub update_interval: Option<Duration>,
    /// The grace delay threshold.
    pub delay_before_gc: Option<Duration>,
}

impl CycleSettings {
    /// Creates a snapshot from a budget and a grace delay.
    pub fn new(update_interval: Option<Duration>, delay_before_gc: Option<Duration>) -> Self {
        Self {
            update_interval,
            delay_before_gc,
        }
    }

    /// Returns the budget, treating zero as absent.
    #[inline]
    pub fn budget(&self) -> Option<Duration> {
        self.update_interval.filter(|d| !d.is_zero())
    }

    /// Returns the grace delay if `remaining` idle time strictly exceeds it.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use cyclevisor::CycleSettings;
    ///
    /// let s = CycleSettings::new(None, Some(Duration::from_secs(3)));
    /// assert_eq!(s.grace_for(Duration::from_secs(5)), Some(Duration::from_secs(3)));
    /// assert_eq!(s.grace_for(Duration::from_secs(1)), None);
    /// assert_eq!(s.grace_for(Duration::from_secs(3)), None);
    ///
    /// // A zero delay hints again right away whenever any idle time is left.
    /// let zero = CycleSettings::new(None, Some(Duration::ZERO));
    /// assert_eq!(zero.grace_for(Duration::from_millis(1)), Some(Duration::ZERO));
    /// assert_eq!(zero.grace_for(Duration::ZERO), None);
    ///
    /// assert_eq!(CycleSettings::default().grace_for(Duration::from_secs(5)), None);
    /// ```
    #[inline]
    pub fn grace_for(&self, remaining: Duration) -> Option<Duration> {
        self.delay_before_gc.filter(|grace| remaining > *grace)
    }
}

/// Source of per-cycle settings.
///
/// `reload` refreshes from the backing store (file, registry, remote config...)
/// and returns the snapshot for the coming cycle. It runs on the loop thread,
/// so keep it reasonably quick.
pub trait Settings: Send + Sync + 'static {
    /// Refreshes and returns the current values.
    fn reload(&self) -> Result<CycleSettings, SettingsError>;
}

impl<S: Settings + ?Sized> Settings for Arc<S> {
    fn reload(&self) -> Result<CycleSettings, SettingsError> {
        (**self).reload()
    }
}
