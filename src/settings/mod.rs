//! # Per-cycle settings.
//!
//! The scheduler calls [`Settings::reload`] exactly once at the top of every
//! cycle and treats the returned [`CycleSettings`] as authoritative for that
//! cycle only.
//!
//! ## Contents
//! - [`Settings`] the contract a backing store implements
//! - [`CycleSettings`] the snapshot (budget + grace delay)
//! - [`StaticSettings`] fixed values
//! - [`SettingsFn`] closure-backed loader
//! - [`SharedSettings`] runtime-mutable values shared with a control context

mod providers;
mod snapshot;

pub use providers::{SettingsFn, SharedSettings, StaticSettings};
pub use snapshot::{CycleSettings, Settings};
