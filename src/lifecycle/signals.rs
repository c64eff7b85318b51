//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM (nothing else)
//! - Translate each delivery into a [`ShutdownSignal`] value
//! - Forward signals to the shutdown coordinator over a channel
//!
//! # Design Decisions
//! - Signals become plain messages; the coordinator, not the handler,
//!   owns the shutdown policy. Tests send on the channel directly and
//!   never depend on OS signal delivery.

use std::time::Instant;

use tokio::sync::mpsc;

/// Kind of termination signal, abstracted from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Interrupt => "interrupt",
            SignalKind::Terminate => "terminate",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivered termination signal. Ephemeral: created per delivery,
/// consumed by the coordinator, never stored.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownSignal {
    pub kind: SignalKind,
    pub received_at: Instant,
}

impl ShutdownSignal {
    pub fn now(kind: SignalKind) -> Self {
        Self {
            kind,
            received_at: Instant::now(),
        }
    }
}

/// Register OS handlers and return the channel the coordinator consumes.
///
/// Every delivery is forwarded, including repeats; deduplication is the
/// coordinator's job so that the idempotency property is testable without
/// real signals.
pub fn listen() -> mpsc::Receiver<ShutdownSignal> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(forward_signals(tx));
    rx
}

#[cfg(unix)]
async fn forward_signals(tx: mpsc::Sender<ShutdownSignal>) {
    use tokio::signal::unix::{signal, SignalKind as OsSignalKind};

    let mut terminate =
        signal(OsSignalKind::terminate()).expect("failed to install SIGTERM handler");

    loop {
        let kind = tokio::select! {
            _ = tokio::signal::ctrl_c() => SignalKind::Interrupt,
            _ = terminate.recv() => SignalKind::Terminate,
        };
        if tx.send(ShutdownSignal::now(kind)).await.is_err() {
            break;
        }
    }
}

#[cfg(not(unix))]
async fn forward_signals(tx: mpsc::Sender<ShutdownSignal>) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            break;
        }
        if tx
            .send(ShutdownSignal::now(SignalKind::Interrupt))
            .await
            .is_err()
        {
            break;
        }
    }
}
