//! # Built-in settings sources.
//!
//! - [`StaticSettings`] never changes.
//! - [`SettingsFn`] delegates to a loader closure (the caller's backing store).
//! - [`SharedSettings`] is a cloneable handle: the control side calls `set_*`,
//!   the loop sees the new values on its next reload.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::SettingsError;
use crate::settings::snapshot::{CycleSettings, Settings};

/// Fixed settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSettings(CycleSettings);

impl StaticSettings {
    /// Creates settings with the given budget and grace delay.
    pub fn new(update_interval: Option<Duration>, delay_before_gc: Option<Duration>) -> Self {
        Self(CycleSettings::new(update_interval, delay_before_gc))
    }
}

impl From<CycleSettings> for StaticSettings {
    fn from(s: CycleSettings) -> Self {
        Self(s)
    }
}

impl Settings for StaticSettings {
    fn reload(&self) -> Result<CycleSettings, SettingsError> {
        Ok(self.0)
    }
}

/// Closure-backed settings loader.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use cyclevisor::{CycleSettings, Settings, SettingsError, SettingsFn};
///
/// let settings = SettingsFn::new(|| {
///     let secs: u64 = std::env::var("UPDATE_INTERVAL_SECS")
///         .unwrap_or_else(|_| "60".into())
///         .parse()
///         .map_err(|e| SettingsError::Invalid { error: format!("{e}") })?;
///     Ok(CycleSettings::new(Some(Duration::from_secs(secs)), None))
/// });
/// assert!(settings.reload().is_ok());
/// ```
pub struct SettingsFn<F> {
    f: F,
}

impl<F> SettingsFn<F>
where
    F: Fn() -> Result<CycleSettings, SettingsError> + Send + Sync + 'static,
{
    /// Wraps a loader closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a loader closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Settings for SettingsFn<F>
where
    F: Fn() -> Result<CycleSettings, SettingsError> + Send + Sync + 'static,
{
    fn reload(&self) -> Result<CycleSettings, SettingsError> {
        (self.f)()
    }
}

/// Settings shared between the loop and a control context.
///
/// Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<CycleSettings>>,
}

impl SharedSettings {
    /// Creates shared settings with initial values.
    pub fn new(initial: CycleSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Replaces all values.
    pub fn set(&self, values: CycleSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = values;
    }

    /// Replaces the cycle budget.
    pub fn set_update_interval(&self, interval: Option<Duration>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .update_interval = interval;
    }

    /// Replaces the grace delay threshold.
    pub fn set_delay_before_gc(&self, delay: Option<Duration>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delay_before_gc = delay;
    }

    /// Returns the current values without going through `reload`.
    pub fn current(&self) -> CycleSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Settings for SharedSettings {
    fn reload(&self) -> Result<CycleSettings, SettingsError> {
        Ok(self.current())
    }
}
