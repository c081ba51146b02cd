//! # OS termination signals for console workers.
//!
//! Used by the loop thread when
//! [`WorkerConfig::listen_for_signals`](crate::WorkerConfig::listen_for_signals)
//! is set. The received signal ends up as the reason of the `StopRequested` event.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`. **Elsewhere:** `Ctrl-C`.

/// Which signal asked the worker to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl ShutdownSignal {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "signal: interrupt",
            ShutdownSignal::Terminate => "signal: terminate",
            ShutdownSignal::Quit => "signal: quit",
        }
    }
}

/// Completes on the first termination signal.
///
/// Returns `Err` if the handlers cannot be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = sigint.recv()  => ShutdownSignal::Interrupt,
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigquit.recv() => ShutdownSignal::Quit,
    };
    Ok(received)
}

/// Completes on Ctrl-C.
///
/// Returns `Err` if the handler cannot be registered.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
