//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment-variable overrides (BIND_HOST, BIND_PORT, APP_ENV, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → owned by the Lifecycle handle for the life of the process
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults so the service runs with zero configuration
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment is an explicit enum threaded through constructors,
//!   never re-read from the ambient process after load

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::Environment;
pub use schema::ServiceConfig;
