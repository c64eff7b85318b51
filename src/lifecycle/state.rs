//! Lifecycle state machine.
//!
//! # States
//! ```text
//! Initializing --start ok--> Listening --signal--> Draining --drained/timeout--> Stopped
//! Initializing --start fails--> (process exit, fatal)
//! ```
//!
//! Stopped is terminal. No state is re-entered once left; a drain request
//! while already Draining or Stopped returns the current state unchanged.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crate::config::schema::{Environment, ServiceConfig};

/// The service's position in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    Initializing = 0,
    Listening = 1,
    Draining = 2,
    Stopped = 3,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Initializing => "initializing",
            LifecycleState::Listening => "listening",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }

    /// Listening is the only state in which the service accepts traffic.
    pub fn is_ready(&self) -> bool {
        matches!(self, LifecycleState::Listening)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Initializing,
            1 => LifecycleState::Listening,
            2 => LifecycleState::Draining,
            _ => LifecycleState::Stopped,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic cell holding the one live [`LifecycleState`].
///
/// Reads are plain atomic loads, safe from any thread at any time.
/// Transitions are compare-exchange and only ever move the numeric value
/// forward, which makes monotonicity a structural property rather than a
/// convention.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Initializing as u8))
    }

    fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Advance to `to` if the current state precedes it.
    /// Returns the state observed before the attempt.
    fn advance(&self, to: LifecycleState) -> LifecycleState {
        let mut current = self.0.load(Ordering::SeqCst);
        while current < to as u8 {
            match self
                .0
                .compare_exchange(current, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(prior) => return LifecycleState::from_u8(prior),
                Err(observed) => current = observed,
            }
        }
        LifecycleState::from_u8(current)
    }
}

/// Owner of the service configuration and the live lifecycle state.
///
/// Constructed once per process (or per test), shared by handle with the
/// few collaborators that need it: the shutdown coordinator and the
/// health reporter.
#[derive(Debug)]
pub struct Lifecycle {
    config: ServiceConfig,
    state: StateCell,
    started_at: Instant,
}

impl Lifecycle {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            state: StateCell::new(),
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Current state. Never blocks, never returns a torn value.
    pub fn current_state(&self) -> LifecycleState {
        self.state.load()
    }

    pub fn is_ready(&self) -> bool {
        self.current_state().is_ready()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Initializing → Listening. Returns false if startup lost the race
    /// with an early shutdown signal.
    pub(crate) fn mark_listening(&self) -> bool {
        self.state.advance(LifecycleState::Listening) == LifecycleState::Initializing
    }

    /// Request drain. Idempotent: while already Draining or Stopped this
    /// is a pure read. Returns the state observed before the call so the
    /// caller can tell whether it initiated the drain.
    pub fn begin_draining(&self) -> LifecycleState {
        let prior = self.state.advance(LifecycleState::Draining);
        if prior < LifecycleState::Draining {
            tracing::debug!(from = %prior, "Lifecycle entering draining");
        }
        prior
    }

    /// Draining → Stopped. Terminal.
    pub fn finish(&self) -> LifecycleState {
        let prior = self.state.advance(LifecycleState::Stopped);
        if prior != LifecycleState::Stopped {
            tracing::debug!(from = %prior, "Lifecycle stopped");
        }
        self.state.load()
    }
}
