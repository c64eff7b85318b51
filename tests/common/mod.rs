//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use service_core::config::schema::{Environment, ServiceConfig};
use service_core::http::server::AppState;
use service_core::lifecycle::signals::ShutdownSignal;
use service_core::lifecycle::startup;
use service_core::lifecycle::state::Lifecycle;
use service_core::{HttpServer, ShutdownCoordinator};

/// A running service instance on an ephemeral port.
pub struct TestInstance {
    pub addr: SocketAddr,
    pub lifecycle: Arc<Lifecycle>,
    /// Resolves to the process exit code the binary would use.
    pub exit: JoinHandle<i32>,
    pub signals: mpsc::Sender<ShutdownSignal>,
}

impl TestInstance {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config bound to localhost:0 in the given environment.
pub fn test_config(environment: Environment) -> ServiceConfig {
    ServiceConfig {
        bind_host: "127.0.0.1".to_string(),
        bind_port: 0,
        environment,
        ..ServiceConfig::default()
    }
}

#[allow(dead_code)]
pub async fn spawn_instance(config: ServiceConfig) -> TestInstance {
    spawn_instance_with_routes(config, axum::Router::new()).await
}

/// Bring up a full instance (listener, server, coordinator) with extra
/// routes mounted, mirroring the binary's wiring.
pub async fn spawn_instance_with_routes(
    config: ServiceConfig,
    routes: axum::Router<AppState>,
) -> TestInstance {
    let lifecycle = Arc::new(Lifecycle::new(config));
    let listener = startup::start(&lifecycle).await.expect("bind failed");
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_routes(lifecycle.clone(), routes);
    let coordinator = ShutdownCoordinator::new(lifecycle.clone());
    let drain = coordinator.drain_watcher();

    let server_task = tokio::spawn(server.run(listener, drain));
    let (signals, signal_rx) = mpsc::channel(4);
    let exit = tokio::spawn(coordinator.run(signal_rx, server_task));

    TestInstance {
        addr,
        lifecycle,
        exit,
        signals,
    }
}

/// Client that does not reuse connections, so a draining listener is
/// observed promptly instead of through a kept-alive socket.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
