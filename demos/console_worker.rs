//! # Example: console_worker
//!
//! Runs a periodic worker in console mode until Ctrl-C.
//!
//! Shows how to:
//! - Implement the [`Cycle`] trait for a body that checks its token.
//! - Feed per-cycle settings from command-line options.
//! - Log worker events through [`LogWriter`] and `tracing-subscriber`.
//!
//! ## Flow
//! ```text
//! main ──► Worker::run_console()
//!     ├─► start(): loop thread + runtime
//!     │     └─► Scheduler: reload → FakeRefresh::run → reclaim → grace → idle
//!     └─► wait() ◄── Ctrl-C (listen_for_signals) raises the token
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example console_worker -- --update-interval 10 --delay-before-gc 3
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::Parser;
use cyclevisor::{
    Cycle, CycleContext, CycleError, LogWriter, ReclaimFn, ReclaimPhase, StaticSettings,
    Subscribe, Worker, WorkerConfig,
};
use tracing_subscriber::EnvFilter;

/// Console options.
#[derive(Parser, Debug)]
#[command(about = "Run a periodic worker until Ctrl-C")]
struct Options {
    /// Minimum seconds between the starts of two cycles (0 = back to back).
    #[arg(long, default_value_t = 10)]
    update_interval: u64,

    /// Seconds to wait before the second reclaim hint (0 = never).
    #[arg(long, default_value_t = 0)]
    delay_before_gc: u64,

    /// Simulated seconds of work per cycle.
    #[arg(long, default_value_t = 2)]
    work: u64,

    /// Every n-th cycle fails (0 = never).
    #[arg(long, default_value_t = 0)]
    fail_every: u64,
}

/// Pretends to refresh something remote.
struct FakeRefresh {
    work: Duration,
    fail_every: u64,
    refreshed: AtomicU64,
}

#[async_trait::async_trait]
impl Cycle for FakeRefresh {
    fn name(&self) -> &str {
        "fake-refresh"
    }

    async fn run(&self, ctx: CycleContext) -> Result<(), CycleError> {
        if self.fail_every > 0 && ctx.cycle() % self.fail_every == 0 {
            return Err(CycleError::fail("upstream returned 503"));
        }

        tokio::select! {
            _ = tokio::time::sleep(self.work) => {}
            _ = ctx.cancelled() => return Err(CycleError::Canceled),
        }

        let total = self.refreshed.fetch_add(1, Ordering::Relaxed) + 1;
        ctx.note(format!("refreshed {total} time(s)"));
        Ok(())
    }
}

fn secs(v: u64) -> Option<Duration> {
    (v > 0).then(|| Duration::from_secs(v))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Options::parse();

    let cfg = WorkerConfig {
        listen_for_signals: true,
        ..WorkerConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let worker = Worker::builder(cfg)
        .with_settings(StaticSettings::new(
            secs(opts.update_interval),
            secs(opts.delay_before_gc),
        ))
        .with_cycle(Arc::new(FakeRefresh {
            work: Duration::from_secs(opts.work),
            fail_every: opts.fail_every,
            refreshed: AtomicU64::new(0),
        }))
        .with_reclaim(ReclaimFn::new(|phase: ReclaimPhase| {
            tracing::trace!(?phase, "nothing to reclaim");
        }))
        .with_subscribers(subs)
        .build()?;

    worker.run_console()?;
    Ok(())
}
