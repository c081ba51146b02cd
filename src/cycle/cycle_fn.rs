//! # Function-backed cycle body (`CycleFn`)
//!
//! [`CycleFn`] wraps a closure `F: Fn(CycleContext) -> Fut`, producing a fresh
//! future per cycle. If state must survive across cycles, capture an `Arc<...>`
//! explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use cyclevisor::{CycleContext, CycleError, CycleFn, CycleRef};
//!
//! let body: CycleRef = CycleFn::arc("refresh", |ctx: CycleContext| async move {
//!     if ctx.is_cancelled() {
//!         return Err(CycleError::Canceled);
//!     }
//!     // do work...
//!     Ok(())
//! });
//!
//! assert_eq!(body.name(), "refresh");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cycle::{Cycle, CycleContext};
use crate::error::CycleError;

/// Function-backed cycle body.
#[derive(Debug)]
pub struct CycleFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F, Fut> CycleFn<F>
where
    F: Fn(CycleContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CycleError>> + Send + 'static,
{
    /// Creates a new function-backed cycle body.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the body and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Cycle for CycleFn<F>
where
    F: Fn(CycleContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CycleError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CycleContext) -> Result<(), CycleError> {
        (self.f)(ctx).await
    }
}
