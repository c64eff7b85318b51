//! Lifecycle core for a long-lived HTTP service.

pub mod config;
pub mod errors;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::{Environment, ServiceConfig};
pub use errors::ServiceError;
pub use http::HttpServer;
pub use lifecycle::shutdown::ShutdownCoordinator;
pub use lifecycle::state::{Lifecycle, LifecycleState};
