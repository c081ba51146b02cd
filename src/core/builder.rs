//! # Worker builder.
//!
//! Collects the injected collaborators and produces a [`Worker`]:
//! - settings source (required)
//! - cycle body (required)
//! - memory-reclaim hint (optional, defaults to [`NoReclaim`])
//! - event subscribers (optional)

use std::sync::Arc;

use crate::{
    core::{
        config::WorkerConfig,
        scheduler::Scheduler,
        worker::{LoopParts, Worker},
    },
    cycle::CycleRef,
    error::RuntimeError,
    events::Bus,
    reclaim::{NoReclaim, Reclaim},
    settings::Settings,
    subscribers::Subscribe,
};

/// Builder for constructing a [`Worker`].
pub struct WorkerBuilder {
    cfg: WorkerConfig,
    settings: Option<Arc<dyn Settings>>,
    cycle: Option<CycleRef>,
    reclaim: Arc<dyn Reclaim>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl WorkerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: WorkerConfig) -> Self {
        Self {
            cfg,
            settings: None,
            cycle: None,
            reclaim: Arc::new(NoReclaim),
            subscribers: Vec::new(),
        }
    }

    /// Sets the settings source reloaded at the top of every cycle.
    ///
    /// Accepts a value or a shared handle (`Arc<S>`).
    pub fn with_settings<S: Settings>(mut self, settings: S) -> Self {
        self.settings = Some(Arc::new(settings));
        self
    }

    /// Sets the cycle body.
    pub fn with_cycle(mut self, cycle: CycleRef) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Sets the memory-reclaim hint.
    pub fn with_reclaim<R: Reclaim>(mut self, reclaim: R) -> Self {
        self.reclaim = Arc::new(reclaim);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive every event the worker publishes through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the worker. Nothing runs until [`Worker::start`].
    ///
    /// Fails with [`RuntimeError::Incomplete`] if the settings source or the
    /// cycle body is missing.
    pub fn build(self) -> Result<Worker, RuntimeError> {
        let settings = self
            .settings
            .ok_or(RuntimeError::Incomplete { missing: "settings" })?;
        let cycle = self
            .cycle
            .ok_or(RuntimeError::Incomplete { missing: "cycle" })?;

        let name: Arc<str> = Arc::from(self.cfg.name_or(cycle.name()));
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let scheduler = Scheduler::new(
            Arc::clone(&name),
            settings,
            cycle,
            self.reclaim,
            bus.clone(),
            self.cfg.fallback_budget(),
        );

        Ok(Worker::from_parts(
            name,
            self.cfg,
            bus,
            LoopParts {
                scheduler,
                subscribers: self.subscribers,
            },
        ))
    }
}
