//! Request identity and context.
//!
//! # Responsibilities
//! - Generate one correlation id per request (UUID v4)
//! - Capture the request's context as early as possible so every log
//!   record and error envelope for the request can be grouped

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::Method;
use uuid::Uuid;

/// Response header the correlation id is echoed on.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Per-request unique token. 128 bits of randomness, so collisions are
/// negligible without coordination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context attached to a request at entry and carried in its extensions
/// for the lifetime of the handling path.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub method: Method,
    pub path: String,
    pub client_address: Option<SocketAddr>,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn capture(request: &Request) -> Self {
        let client_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        Self {
            correlation_id: CorrelationId::generate(),
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            client_address,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}
