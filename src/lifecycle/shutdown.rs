//! Shutdown coordination.
//!
//! The coordinator is the only component allowed to drive the lifecycle
//! through Draining → Stopped. Sequence on the first signal:
//!
//! ```text
//! log signal kind once → begin_draining() → stop accepting connections
//! → wait for in-flight requests or the grace deadline → finish()
//! → exit code (0 drained cleanly, 1 forced or close error)
//! ```
//!
//! Every later signal, of either kind, is observably ignored: no second
//! log line, no second close. A double close of an already-closing
//! listener is a known crash source in this class of service, so the
//! idempotency here is a correctness property.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::lifecycle::signals::ShutdownSignal;
use crate::lifecycle::state::{Lifecycle, LifecycleState};

/// Result type the serve loop resolves to.
pub type ServeResult = Result<(), std::io::Error>;

/// Coordinator for graceful shutdown.
pub struct ShutdownCoordinator {
    lifecycle: Arc<Lifecycle>,
    /// Flipped to true exactly once, when draining begins. The serve
    /// loop watches this to stop accepting new connections.
    drain_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        let (drain_tx, _) = watch::channel(false);
        Self { lifecycle, drain_tx }
    }

    /// Watcher handed to the serve loop's graceful-shutdown future.
    pub fn drain_watcher(&self) -> watch::Receiver<bool> {
        self.drain_tx.subscribe()
    }

    /// Apply one delivered signal to the state machine.
    ///
    /// Returns true when this delivery initiated the drain; false for
    /// duplicates arriving while already Draining or Stopped. This is the
    /// transition entry point tests call directly.
    pub fn handle_signal(&self, signal: ShutdownSignal) -> bool {
        match self.lifecycle.begin_draining() {
            LifecycleState::Draining | LifecycleState::Stopped => {
                tracing::debug!(kind = %signal.kind, "Duplicate shutdown signal ignored");
                false
            }
            prior => {
                tracing::info!(
                    kind = %signal.kind,
                    from = %prior,
                    grace_ms = self.lifecycle.config().shutdown_grace_ms,
                    "Shutdown signal received, draining"
                );
                // Stop accepting; open connections finish naturally.
                let _ = self.drain_tx.send(true);
                true
            }
        }
    }

    /// Drive the full shutdown sequence. Resolves to the process exit
    /// code once the lifecycle reaches Stopped.
    ///
    /// `server_task` is the spawned serve loop; it resolves when the
    /// listener has closed and all in-flight requests have finished.
    pub async fn run(
        self,
        mut signals: mpsc::Receiver<ShutdownSignal>,
        mut server_task: JoinHandle<ServeResult>,
    ) -> i32 {
        let grace = self.lifecycle.config().shutdown_grace();

        // Phase 1: wait for the first effective shutdown trigger. The
        // serve loop ending on its own before any signal means the
        // service died in an unknown state, which is treated as fatal.
        loop {
            tokio::select! {
                delivered = signals.recv() => {
                    match delivered {
                        Some(signal) => {
                            if self.handle_signal(signal) {
                                break;
                            }
                        }
                        None => {
                            // Channel owner dropped; drain as if signaled.
                            tracing::debug!("Signal channel closed, draining");
                            self.lifecycle.begin_draining();
                            let _ = self.drain_tx.send(true);
                            break;
                        }
                    }
                }
                result = &mut server_task => {
                    self.lifecycle.begin_draining();
                    self.lifecycle.finish();
                    match result {
                        Ok(Ok(())) => {
                            tracing::error!("Server stopped before any shutdown signal");
                        }
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "Server failed");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Server task panicked");
                        }
                    }
                    return 1;
                }
            }
        }

        // Phase 2: draining. Wait for the serve loop to finish its
        // in-flight work or for the grace deadline, whichever is first.
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        // Once every sender is gone the channel yields None on each
        // poll; without the guard below the select would spin on that
        // arm for the rest of the drain window.
        let mut signals_open = true;
        let exit_code = loop {
            tokio::select! {
                result = &mut server_task => {
                    match result {
                        Ok(Ok(())) => {
                            tracing::info!("Drain complete, all in-flight requests finished");
                            break 0;
                        }
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "Listener reported a close error");
                            break 1;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Server task panicked during drain");
                            break 1;
                        }
                    }
                }
                _ = &mut deadline => {
                    tracing::warn!(
                        grace_ms = grace.as_millis() as u64,
                        "Grace period exceeded, forcing shutdown"
                    );
                    server_task.abort();
                    break 1;
                }
                delivered = signals.recv(), if signals_open => {
                    // Duplicates while draining: absorb without effect.
                    match delivered {
                        Some(signal) => {
                            self.handle_signal(signal);
                        }
                        None => signals_open = false,
                    }
                }
            }
        };

        self.lifecycle.finish();
        tracing::info!(exit_code, state = %self.lifecycle.current_state(), "Shutdown complete");
        exit_code
    }
}
