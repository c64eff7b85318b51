//! HTTP surface of the lifecycle core.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful-shutdown wiring)
//!     → request.rs (correlation id, RequestContext into extensions)
//!     → observability::logging middleware (start/finish records)
//!     → route handler / fallback 404
//!     → response.rs (error envelope projection, correlation header)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationId, RequestContext, X_CORRELATION_ID};
pub use server::HttpServer;
