//! # Per-worker fan-out of events to subscribers.
//!
//! [`SubscriberSet`] belongs to one worker. The worker's listener hands it
//! every event from the bus; the set copies the event into one bounded queue
//! per subscriber, each drained by its own task on the loop thread's runtime.
//!
//! ```text
//! listener ──► emit(&Event) ──► Arc<Event>
//!                                  ├──► [queue: LogWriter] ──► deliver ──► on_event
//!                                  ├──► [queue: metrics]   ──► deliver ──► on_event
//!                                  └──► [queue: custom]    ──► deliver ──► on_event
//! ```
//!
//! ## Rules
//! - `emit` never waits: a full queue drops the event for that subscriber only
//!   and publishes `SubscriberOverflow` with the running drop count
//! - a panicking subscriber keeps receiving later events; each panic is
//!   published as `SubscriberPanicked` tagged with the cycle being reported
//! - reports about overflow never trigger further overflow reports
//! - `shutdown` drains what is queued, then logs any drop totals through `tracing`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Queue end plus drop accounting for one subscriber.
struct Queue {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
}

/// Fan-out from one worker's bus to its subscribers.
///
/// Must be created inside a tokio runtime.
pub struct SubscriberSet {
    worker: Arc<str>,
    queues: Vec<Queue>,
    tasks: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one delivery task per subscriber.
    ///
    /// `worker` labels the overflow and panic reports this set publishes.
    #[must_use]
    pub fn new(worker: Arc<str>, subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (queues, tasks): (Vec<Queue>, Vec<JoinHandle<()>>) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let queue = Queue {
                    name: sub.name(),
                    tx,
                    dropped: AtomicU64::new(0),
                };
                let task = tokio::spawn(deliver(sub, rx, Arc::clone(&worker), bus.clone()));
                (queue, task)
            })
            .unzip();

        Self {
            worker,
            queues,
            tasks,
            bus,
        }
    }

    /// Queues `event` for every subscriber without waiting.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        let about_overflow = event.kind == EventKind::SubscriberOverflow;

        for q in &self.queues {
            let reason = match q.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            let dropped = q.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if !about_overflow {
                self.bus.publish(
                    Event::new(EventKind::SubscriberOverflow)
                        .with_worker(Arc::clone(&self.worker))
                        .with_subscriber(q.name)
                        .with_dropped(dropped)
                        .with_reason(reason),
                );
            }
        }
    }

    /// Closes the queues and waits until every subscriber has handled what
    /// was already queued.
    pub async fn shutdown(self) {
        let mut totals = Vec::with_capacity(self.queues.len());
        for q in self.queues {
            totals.push((q.name, q.dropped.into_inner()));
            drop(q.tx);
        }
        for task in self.tasks {
            let _ = task.await;
        }
        for (subscriber, dropped) in totals.into_iter().filter(|(_, d)| *d > 0) {
            tracing::warn!(worker = %self.worker, subscriber, dropped, "events dropped for slow subscriber");
        }
    }
}

/// Feeds one subscriber until its queue is closed and empty.
async fn deliver(
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    worker: Arc<str>,
    bus: Bus,
) {
    while let Some(ev) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(panic_err) = handled {
            let mut report = Event::new(EventKind::SubscriberPanicked)
                .with_worker(Arc::clone(&worker))
                .with_subscriber(sub.name())
                .with_reason(panic_message(&*panic_err));
            if let Some(cycle) = ev.cycle {
                report = report.with_cycle(cycle);
            }
            bus.publish(report);
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
