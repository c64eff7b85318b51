//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Initializing → Listening
//!     Bind failure → fatal, process exits with a per-cause code
//!
//! Shutdown (shutdown.rs):
//!     First signal → Draining → stop accepting → wait for in-flight
//!     → Stopped → exit 0 (drained) / exit 1 (grace exceeded or close error)
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → ShutdownSignal delivered to the coordinator
//! ```
//!
//! # Design Decisions
//! - One state cell (state.rs) is the single source of truth; readers
//!   never observe an intermediate value
//! - Transitions are monotonic; duplicate shutdown triggers are no-ops
//! - Only the coordinator drives Draining → Stopped
//! - Tests call the coordinator's transition entry point directly; OS
//!   signal registration is a thin adapter on top

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;
