//! In-flight request tracking.
//!
//! Atomic counters plus an RAII guard: the count stays correct even when
//! a handler panics, because the guard decrements on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks requests currently being handled and the running total.
#[derive(Debug, Clone, Default)]
pub struct InflightTracker {
    in_flight: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
}

impl InflightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request entering the handling path. Returns a guard that
    /// decrements the in-flight count when dropped.
    pub fn begin(&self) -> InflightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::Relaxed);
        InflightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Requests currently in flight.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Requests accepted since startup.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Resolve once no requests remain in flight. Polls; callers bound
    /// the wait with their own deadline.
    pub async fn drained(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

/// Guard for one in-flight request.
#[derive(Debug)]
pub struct InflightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
