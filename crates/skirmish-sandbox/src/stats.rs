//! Per-context counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::DecisionFault;

/// Lock-free counters for one execution context.
#[derive(Debug, Default)]
pub struct SandboxStats {
    decisions: AtomicU64,
    timeouts: AtomicU64,
    runtime_faults: AtomicU64,
    malformed: AtomicU64,
    saturated: AtomicU64,
    closed: AtomicU64,
    swaps_applied: AtomicU64,
    swaps_rejected: AtomicU64,
}

/// A point-in-time copy of [`SandboxStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SandboxStatsSnapshot {
    /// Decisions answered by the script.
    pub decisions: u64,
    /// Calls that ran out of time.
    pub timeouts: u64,
    /// Calls where the script raised an error.
    pub runtime_faults: u64,
    /// Calls that returned something other than a decision map.
    pub malformed: u64,
    /// Calls refused because the queue was full.
    pub saturated: u64,
    /// Calls made after the context shut down.
    pub closed: u64,
    /// Hot-swaps installed.
    pub swaps_applied: u64,
    /// Hot-swaps refused.
    pub swaps_rejected: u64,
}

impl SandboxStats {
    /// Count one answered decision.
    pub fn record_decision(&self) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one fallback to the neutral decision.
    pub fn record_fault(&self, fault: DecisionFault) {
        let counter = match fault {
            DecisionFault::Timeout => &self.timeouts,
            DecisionFault::Runtime => &self.runtime_faults,
            DecisionFault::Malformed => &self.malformed,
            DecisionFault::Saturated => &self.saturated,
            DecisionFault::Closed => &self.closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one hot-swap result.
    pub fn record_swap(&self, applied: bool) {
        let counter = if applied { &self.swaps_applied } else { &self.swaps_rejected };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> SandboxStatsSnapshot {
        SandboxStatsSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            runtime_faults: self.runtime_faults.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            saturated: self.saturated.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
            swaps_applied: self.swaps_applied.load(Ordering::Relaxed),
            swaps_rejected: self.swaps_rejected.load(Ordering::Relaxed),
        }
    }
}

impl SandboxStatsSnapshot {
    /// Total fallbacks to the neutral decision.
    pub const fn faults(&self) -> u64 {
        self.timeouts
            .saturating_add(self.runtime_faults)
            .saturating_add(self.malformed)
            .saturating_add(self.saturated)
            .saturating_add(self.closed)
    }
}
