//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: health route, caller-supplied routes,
//!   fallback 404
//! - Wire middleware: panic containment, request tracking, tracing
//! - Serve with graceful shutdown driven by the coordinator's drain
//!   watcher

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::errors::ErrorClassifier;
use crate::health::inflight::InflightTracker;
use crate::health::reporter::health_handler;
use crate::http::response::{not_found_handler, panic_responder};
use crate::lifecycle::state::Lifecycle;
use crate::observability::logging::track_requests;

/// State injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<Lifecycle>,
    pub inflight: InflightTracker,
    pub classifier: Arc<ErrorClassifier>,
}

/// HTTP server owning the assembled router.
pub struct HttpServer {
    router: Router,
    lifecycle: Arc<Lifecycle>,
    inflight: InflightTracker,
}

impl HttpServer {
    /// Server with only the lifecycle core's routes (health + fallback).
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self::with_routes(lifecycle, Router::new())
    }

    /// Server with caller-supplied routes mounted under the core's
    /// middleware stack. Handlers returning [`crate::ServiceError`] get
    /// classified envelopes; panicking handlers are contained.
    pub fn with_routes(lifecycle: Arc<Lifecycle>, routes: Router<AppState>) -> Self {
        let inflight = InflightTracker::new();
        let state = AppState {
            lifecycle: lifecycle.clone(),
            inflight: inflight.clone(),
            classifier: Arc::new(ErrorClassifier::new(lifecycle.environment())),
        };
        let router = Self::build_router(state, routes);
        Self {
            router,
            lifecycle,
            inflight,
        }
    }

    fn build_router(state: AppState, routes: Router<AppState>) -> Router {
        // Layer order matters: track_requests wraps the panic responder
        // so it sees the contained response and logs the final status;
        // TraceLayer sits outermost around everything.
        routes
            .route("/health", get(health_handler))
            .fallback(not_found_handler)
            .layer(CatchPanicLayer::custom(panic_responder))
            .with_state(state.clone())
            .layer(axum::middleware::from_fn_with_state(state, track_requests))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until draining completes, then close and resolve.
    ///
    /// Drain order is: readiness flips (the middleware rejects new work
    /// and probes answer 503), in-flight requests finish, then the
    /// listener closes. Connections accepted a moment before draining
    /// began complete naturally; the close never races them.
    pub async fn run(
        self,
        listener: TcpListener,
        mut drain: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            state = %self.lifecycle.current_state(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let inflight = self.inflight.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = drain.wait_for(|draining| *draining).await;
                inflight.drained().await;
                tracing::info!("In-flight requests drained, closing listener");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
