//! Error taxonomy, classification and envelope construction.
//!
//! # Data Flow
//! ```text
//! handler returns ServiceError ──┐
//! handler panics (any payload) ──┼─→ RaisedFault
//!                                │       → ErrorClassifier::classify
//!                                │       → ErrorEnvelope (logged here)
//!                                └─→ wire projection (http/response.rs)
//! ```
//!
//! # Design Decisions
//! - Two-variant fault type instead of shape-probing: either a typed
//!   operational error or an unclassified payload of unknown type
//! - Operational messages are always surfaced; unclassified faults are
//!   redacted to a fixed string in production
//! - Every envelope is logged exactly once, at `error` for 5xx and
//!   `warn` for 4xx

use std::any::Any;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::Environment;

/// Fixed message substituted for non-operational faults in production.
pub const REDACTED_MESSAGE: &str = "Internal server error";

/// Typed errors the request path may return.
///
/// All variants except `Internal` are operational: expected, caller-facing
/// conditions whose messages are safe to surface in any environment.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        /// Failing field names / constraint descriptions.
        details: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// Operational error outside the named taxonomy, carrying its own
    /// status. Codes outside [400, 600) are clamped to 500 at
    /// classification time.
    #[error("{message}")]
    WithStatus {
        status_code: u16,
        error_code: String,
        message: String,
    },

    /// Unexpected internal fault. Redacted in production.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation { .. } => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::Conflict(_) => 409,
            ServiceError::WithStatus { status_code, .. } => *status_code,
            ServiceError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            ServiceError::Validation { .. } => "VALIDATION_ERROR",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::WithStatus { error_code, .. } => error_code,
            ServiceError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn is_operational(&self) -> bool {
        !matches!(self, ServiceError::Internal(_))
    }
}

/// Anything the request path raised: a typed error or a panic payload.
///
/// Panic payloads are `Box<dyn Any>` and may be a `&str`, a `String`, or
/// any other type; the ambiguity is represented here instead of probed
/// for downstream.
#[derive(Debug, Clone)]
pub enum RaisedFault {
    Classified(ServiceError),
    /// Best-effort description of a panic payload; `None` when the
    /// payload was not a string of any kind.
    Unclassified(Option<String>),
}

impl RaisedFault {
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            Some((*s).to_string())
        } else {
            payload.downcast_ref::<String>().cloned()
        };
        RaisedFault::Unclassified(message)
    }
}

impl From<ServiceError> for RaisedFault {
    fn from(err: ServiceError) -> Self {
        RaisedFault::Classified(err)
    }
}

/// Typed envelope produced for every failed request.
///
/// Holds the unredacted message; redaction happens in the wire
/// projection so internal logs keep full detail.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    /// Always within [400, 600).
    pub status_code: u16,
    pub error_code: String,
    pub message: String,
    pub details: Option<Value>,
    pub is_operational: bool,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Message as sent over the wire: verbatim for operational errors
    /// and outside production, the fixed generic string otherwise.
    pub fn wire_message(&self, environment: Environment) -> &str {
        if environment.is_production() && !self.is_operational {
            REDACTED_MESSAGE
        } else {
            &self.message
        }
    }

    /// Details as sent over the wire: only validation-class errors carry
    /// them, and never in production.
    pub fn wire_details(&self, environment: Environment) -> Option<&Value> {
        if environment.is_production() {
            None
        } else {
            self.details.as_ref()
        }
    }

    /// Redacted JSON projection for the response body.
    pub fn wire_body(&self, environment: Environment) -> Value {
        let mut error = serde_json::json!({
            "code": self.error_code,
            "message": self.wire_message(environment),
        });
        if let Some(details) = self.wire_details(environment) {
            error["details"] = details.clone();
        }
        serde_json::json!({
            "status": "error",
            "error": error,
            "correlation_id": self.correlation_id,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

/// Pull a caller-supplied status into the error range.
pub fn clamp_status(code: u16) -> u16 {
    if (400..600).contains(&code) {
        code
    } else {
        500
    }
}

/// Maps any raised fault to an [`ErrorEnvelope`] and logs it.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    environment: Environment,
}

impl ErrorClassifier {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Classify one fault. Each call produces and logs exactly one
    /// envelope; the caller turns it into the response body.
    pub fn classify(&self, fault: RaisedFault, correlation_id: &str) -> ErrorEnvelope {
        let envelope = match fault {
            RaisedFault::Classified(err) if err.is_operational() => ErrorEnvelope {
                status_code: clamp_status(err.status_code()),
                error_code: err.error_code().to_string(),
                message: err.to_string(),
                details: match err {
                    ServiceError::Validation { details, .. } => details,
                    _ => None,
                },
                is_operational: true,
                correlation_id: correlation_id.to_string(),
                timestamp: Utc::now(),
            },
            RaisedFault::Classified(err) => ErrorEnvelope {
                status_code: 500,
                error_code: "INTERNAL_SERVER_ERROR".to_string(),
                message: err.to_string(),
                details: None,
                is_operational: false,
                correlation_id: correlation_id.to_string(),
                timestamp: Utc::now(),
            },
            RaisedFault::Unclassified(message) => ErrorEnvelope {
                status_code: 500,
                error_code: "INTERNAL_SERVER_ERROR".to_string(),
                message: message.unwrap_or_else(|| "Unknown internal fault".to_string()),
                details: None,
                is_operational: false,
                correlation_id: correlation_id.to_string(),
                timestamp: Utc::now(),
            },
        };

        if envelope.status_code >= 500 {
            tracing::error!(
                correlation_id = %envelope.correlation_id,
                error_code = %envelope.error_code,
                status_code = envelope.status_code,
                is_operational = envelope.is_operational,
                message = %envelope.message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                correlation_id = %envelope.correlation_id,
                error_code = %envelope.error_code,
                status_code = envelope.status_code,
                message = %envelope.message,
                "Request failed"
            );
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(environment: Environment, fault: RaisedFault) -> ErrorEnvelope {
        ErrorClassifier::new(environment).classify(fault, "cid-1")
    }

    #[test]
    fn operational_errors_pass_through() {
        let envelope = classify(
            Environment::Production,
            ServiceError::NotFound("user 42 not found".into()).into(),
        );
        assert_eq!(envelope.status_code, 404);
        assert_eq!(envelope.error_code, "NOT_FOUND");
        assert!(envelope.is_operational);
        // Operational messages are never redacted, even in production.
        assert_eq!(envelope.wire_message(Environment::Production), "user 42 not found");
    }

    #[test]
    fn internal_faults_become_500() {
        let envelope = classify(
            Environment::Development,
            ServiceError::Internal("db connection lost".into()).into(),
        );
        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.error_code, "INTERNAL_SERVER_ERROR");
        assert!(!envelope.is_operational);
        assert_eq!(envelope.wire_message(Environment::Development), "db connection lost");
        assert_eq!(envelope.wire_message(Environment::Production), REDACTED_MESSAGE);
    }

    #[test]
    fn panic_payloads_of_any_shape_are_handled() {
        let as_str = RaisedFault::from_panic(Box::new("boom"));
        let envelope = classify(Environment::Test, as_str);
        assert_eq!(envelope.message, "boom");

        let as_string = RaisedFault::from_panic(Box::new(String::from("kaput")));
        let envelope = classify(Environment::Test, as_string);
        assert_eq!(envelope.message, "kaput");

        // A non-string payload still classifies instead of being rejected.
        let opaque = RaisedFault::from_panic(Box::new(42_u32));
        let envelope = classify(Environment::Test, opaque);
        assert_eq!(envelope.message, "Unknown internal fault");
        assert_eq!(envelope.status_code, 500);
    }

    #[test]
    fn out_of_range_status_codes_clamp_to_500() {
        for code in [0, 200, 399, 600, 999] {
            let envelope = classify(
                Environment::Test,
                ServiceError::WithStatus {
                    status_code: code,
                    error_code: "TEAPOT_ADJACENT".into(),
                    message: "odd status".into(),
                }
                .into(),
            );
            assert_eq!(envelope.status_code, 500, "code {} should clamp", code);
        }
        let envelope = classify(
            Environment::Test,
            ServiceError::WithStatus {
                status_code: 429,
                error_code: "RATE_LIMITED".into(),
                message: "slow down".into(),
            }
            .into(),
        );
        assert_eq!(envelope.status_code, 429);
    }

    #[test]
    fn validation_details_dropped_in_production() {
        let fault = || {
            RaisedFault::from(ServiceError::Validation {
                message: "email is invalid".into(),
                details: Some(serde_json::json!({ "field": "email" })),
            })
        };
        let envelope = classify(Environment::Development, fault());
        assert!(envelope.wire_details(Environment::Development).is_some());

        let envelope = classify(Environment::Production, fault());
        assert!(envelope.wire_details(Environment::Production).is_none());
        // Message itself stays: validation errors are operational.
        assert_eq!(envelope.wire_message(Environment::Production), "email is invalid");
    }

    #[test]
    fn wire_body_has_status_error_and_timestamp() {
        let envelope = classify(
            Environment::Test,
            ServiceError::Conflict("version mismatch".into()).into(),
        );
        let body = envelope.wire_body(Environment::Test);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["correlation_id"], "cid-1");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
