//! Health and readiness reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → reporter.rs reads the lifecycle state cell and process counters
//!     → HealthSnapshot (computed per read, never cached)
//!     → 200 while Listening, 503 otherwise
//!
//! Request middleware
//!     → inflight.rs guard increments/decrements the in-flight counter
//!     → feeds HealthSnapshot.process
//! ```
//!
//! # Design Decisions
//! - Readiness is derived solely from lifecycle state: Listening is the
//!   only ready condition, so a draining instance answers 503 and load
//!   balancers take it out of rotation before the listener closes
//! - Side-effect-free and non-blocking, callable mid-drain

pub mod inflight;
pub mod reporter;

pub use inflight::InflightTracker;
pub use reporter::HealthSnapshot;
