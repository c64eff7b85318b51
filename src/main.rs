//! service-core binary.
//!
//! # Startup / shutdown sequence
//!
//! ```text
//! Load config → init tracing → bind listener (Initializing → Listening)
//!     → serve requests
//!     → SIGINT/SIGTERM → drain (Listening → Draining)
//!     → in-flight done or grace elapsed (Draining → Stopped)
//!     → process exit (0 clean, 1 forced)
//! ```
//!
//! Startup errors are fatal: a failed bind logs the cause and exits with a
//! code that distinguishes address-in-use from permission problems.

use std::sync::Arc;

use service_core::config::loader;
use service_core::lifecycle::shutdown::ShutdownCoordinator;
use service_core::lifecycle::state::Lifecycle;
use service_core::lifecycle::{signals, startup};
use service_core::observability::logging;
use service_core::HttpServer;

/// Exit code for a configuration that failed to load or validate.
const EXIT_CONFIG: i32 = 78;

#[tokio::main]
async fn main() {
    // Config must load before tracing init: the log level comes from it.
    let config = match loader::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    logging::init(&config);

    tracing::info!(
        environment = %config.environment,
        bind_address = %config.bind_address(),
        shutdown_grace_ms = config.shutdown_grace_ms,
        "service-core v{} starting",
        env!("CARGO_PKG_VERSION"),
    );

    let lifecycle = Arc::new(Lifecycle::new(config));

    let listener = match startup::start(&lifecycle).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start listener");
            std::process::exit(e.exit_code());
        }
    };

    let server = HttpServer::new(lifecycle.clone());
    let coordinator = ShutdownCoordinator::new(lifecycle.clone());
    let drain = coordinator.drain_watcher();

    let server_task = tokio::spawn(server.run(listener, drain));
    let signal_rx = signals::listen();

    let exit_code = coordinator.run(signal_rx, server_task).await;
    std::process::exit(exit_code);
}
