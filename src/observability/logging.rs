//! Structured logging: subscriber setup and request tracking middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::schema::{Environment, ServiceConfig};
use crate::errors::{RaisedFault, ServiceError};
use crate::http::request::RequestContext;
use crate::http::response::{render, set_correlation_header};
use crate::http::server::AppState;
use crate::lifecycle::state::LifecycleState;

/// Install the global tracing subscriber.
///
/// Production emits JSON for log aggregation; development gets the
/// human-readable format. The test environment writes to a sink: the
/// tracing calls still execute (so assertions on call counts hold) but
/// nothing reaches the console. Calling this twice is a no-op, which
/// keeps multi-instance tests safe.
pub fn init(config: &ServiceConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("service_core={},tower_http=info", config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.environment {
        Environment::Production => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        Environment::Development => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        Environment::Test => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
            .try_init(),
    };
}

/// Outermost request middleware: correlation tagging, in-flight
/// accounting, entry/exit records, and error-envelope finalization.
pub async fn track_requests(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::capture(&request);
    request.extensions_mut().insert(ctx.clone());

    let _guard = state.inflight.begin();

    tracing::info!(
        event = "request_started",
        method = %ctx.method,
        path = %ctx.path,
        correlation_id = %ctx.correlation_id,
        client_address = ?ctx.client_address,
    );

    // No new work is accepted once draining has begun. Requests already
    // past this point finish naturally; health probes are still answered
    // so load balancers observe the 503 and remove the instance.
    let state_now = state.lifecycle.current_state();
    let mut response = if state_now >= LifecycleState::Draining && ctx.path != "/health" {
        let fault = RaisedFault::Classified(ServiceError::WithStatus {
            status_code: 503,
            error_code: "SERVICE_UNAVAILABLE".to_string(),
            message: "Service is shutting down".to_string(),
        });
        let envelope = state.classifier.classify(fault, ctx.correlation_id.as_str());
        render(&envelope, state.classifier.environment())
    } else {
        next.run(request).await
    };

    // Handlers and the panic responder surface failures as a fault
    // extension; classify here, where environment and correlation id
    // are both in hand, and swap in the envelope body.
    if let Some(fault) = response.extensions_mut().remove::<RaisedFault>() {
        let envelope = state.classifier.classify(fault, ctx.correlation_id.as_str());
        response = render(&envelope, state.classifier.environment());
    }

    set_correlation_header(&mut response, ctx.correlation_id.as_str());

    let status = response.status();
    let duration_ms = ctx.elapsed_ms();
    if status.is_client_error() || status.is_server_error() {
        tracing::error!(
            event = "request_completed",
            method = %ctx.method,
            path = %ctx.path,
            status_code = status.as_u16(),
            duration_ms,
            correlation_id = %ctx.correlation_id,
        );
    } else if status.is_redirection() {
        tracing::warn!(
            event = "request_completed",
            method = %ctx.method,
            path = %ctx.path,
            status_code = status.as_u16(),
            duration_ms,
            correlation_id = %ctx.correlation_id,
        );
    } else {
        tracing::info!(
            event = "request_completed",
            method = %ctx.method,
            path = %ctx.path,
            status_code = status.as_u16(),
            duration_ms,
            correlation_id = %ctx.correlation_id,
        );
    }

    response
}
