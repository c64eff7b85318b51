//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request entry
//!     → logging.rs middleware: correlation id + request_started record
//!     → handler
//!     → fault extension classified into an envelope (errors module logs it)
//!     → request_completed record, level by status class
//! ```
//!
//! # Design Decisions
//! - One subscriber per process: pretty output in development, JSON in
//!   production, a sink writer in test so call counts stay observable
//!   without drowning test output
//! - Correlation id flows through every record for a request

pub mod logging;
