//! Health and readiness snapshot.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::schema::Environment;
use crate::health::inflight::InflightTracker;
use crate::http::server::AppState;
use crate::lifecycle::state::Lifecycle;

/// Basic process counters included in the snapshot.
#[derive(Debug, Serialize)]
pub struct ProcessMetrics {
    pub requests_in_flight: u64,
    pub requests_total: u64,
}

/// Point-in-time view of the service, computed fresh for every probe.
#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    /// "ok" while Listening, "unavailable" otherwise.
    pub status: &'static str,
    pub state: &'static str,
    pub uptime_ms: u64,
    pub environment: Environment,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub process: ProcessMetrics,
}

impl HealthSnapshot {
    pub fn capture(lifecycle: &Lifecycle, inflight: &InflightTracker) -> Self {
        let state = lifecycle.current_state();
        Self {
            status: if state.is_ready() { "ok" } else { "unavailable" },
            state: state.as_str(),
            uptime_ms: lifecycle.uptime().as_millis() as u64,
            environment: lifecycle.environment(),
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
            process: ProcessMetrics {
                requests_in_flight: inflight.in_flight(),
                requests_total: inflight.total(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ok"
    }
}

/// `GET /health`: 200 with the snapshot while Listening, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let snapshot = HealthSnapshot::capture(&state.lifecycle, &state.inflight);
    let status = if snapshot.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot)).into_response()
}
