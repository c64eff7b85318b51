//! Response construction for failures.
//!
//! # Responsibilities
//! - Turn a [`ServiceError`] returned by a handler into an interim
//!   response carrying the fault as an extension
//! - Render a classified [`ErrorEnvelope`] as the final JSON body
//! - Build the fixed 404 body for unmatched routes
//!
//! The interim-response trick exists because the classifier needs the
//! environment and correlation id, which only the outermost middleware
//! holds; handlers stay free of that plumbing.

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::config::schema::Environment;
use crate::errors::{clamp_status, ErrorEnvelope, RaisedFault, ServiceError};

impl IntoResponse for ServiceError {
    /// Minimal response with the right status; the logging middleware
    /// replaces the body with the classified envelope before the
    /// response leaves the service.
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(clamp_status(self.status_code()))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response
            .extensions_mut()
            .insert(RaisedFault::Classified(self));
        response
    }
}

/// Responder installed under `CatchPanicLayer`: carries the payload out
/// as a fault extension for the middleware to classify.
pub fn panic_responder(payload: Box<dyn std::any::Any + Send + 'static>) -> Response<Body> {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response
        .extensions_mut()
        .insert(RaisedFault::from_panic(payload));
    response
}

/// Final wire form of a classified envelope.
pub fn render(envelope: &ErrorEnvelope, environment: Environment) -> Response {
    let status = StatusCode::from_u16(envelope.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope.wire_body(environment))).into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found_handler(method: Method, uri: Uri) -> Response {
    let body = serde_json::json!({
        "status": "error",
        "message": format!("Route {} {} not found", method, uri.path()),
        "timestamp": Utc::now().to_rfc3339(),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Echo the correlation id back to the client.
pub fn set_correlation_header(response: &mut Response, correlation_id: &str) {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static(super::X_CORRELATION_ID), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_response_carries_fault() {
        let response = ServiceError::Forbidden("no access".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<RaisedFault>().is_some());
    }

    #[test]
    fn panic_responder_builds_500_with_fault() {
        let response = panic_responder(Box::new("handler blew up"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        match response.extensions().get::<RaisedFault>() {
            Some(RaisedFault::Unclassified(Some(message))) => {
                assert_eq!(message, "handler blew up")
            }
            other => panic!("unexpected fault: {:?}", other),
        }
    }
}
