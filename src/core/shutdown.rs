//! # Host shutdown signals.
//!
//! [`wait_for_shutdown_signal`] resolves with the [`ShutdownSignal`] that ended the
//! wait, so [`TickScheduler::run`](crate::TickScheduler::run) can report why the host
//! loop stopped.
//!
//! ## Signals
//! ```text
//! unix:      SIGINT ──► Interrupt   SIGTERM ──► Terminate   SIGQUIT ──► Quit
//! elsewhere: Ctrl-C ──► Interrupt
//! ```

use std::fmt;

/// Termination signal received by the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// `SIGINT` or Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
    /// `SIGQUIT`.
    Quit,
}

impl ShutdownSignal {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "interrupt",
            ShutdownSignal::Terminate => "terminate",
            ShutdownSignal::Quit => "quit",
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Waits for the first termination signal and returns it.
///
/// Fails only if the listeners cannot be registered.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = interrupt.recv() => ShutdownSignal::Interrupt,
        _ = terminate.recv() => ShutdownSignal::Terminate,
        _ = quit.recv() => ShutdownSignal::Quit,
    };
    Ok(received)
}

/// Waits for Ctrl-C.
///
/// Fails only if the listener cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}

/// Like [`wait_for_shutdown_signal`], but a registration failure is logged and the
/// future never completes, so the host loop keeps running on its token alone.
pub(crate) async fn shutdown_signal_or_pending() -> ShutdownSignal {
    match wait_for_shutdown_signal().await {
        Ok(received) => received,
        Err(err) => {
            tracing::warn!(error = %err, "cannot install shutdown signal handlers");
            std::future::pending().await
        }
    }
}
