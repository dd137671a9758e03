//! [`AgentSandbox`]: the host-side handle to one agent's execution context.
//!
//! Every operation is bounded. A decision call either returns the script's
//! coerced answer within the per-call bound or the neutral decision; it never
//! errors and never blocks the scheduler past the bound. Hot-swaps are
//! atomic: the new logic is installed only if it passes containment and
//! compiles before the swap deadline, otherwise the old logic keeps running.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use skirmish_types::{AgentId, Decision, DecisionRequest};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::containment;
use crate::context::{self, Command, SwapTicket};
use crate::error::{DecisionFault, SandboxError};
use crate::limits::SandboxLimits;
use crate::stats::{SandboxStats, SandboxStatsSnapshot};

/// Extra time the host waits past a swap deadline for the context's answer.
const SWAP_GRACE: Duration = Duration::from_millis(50);

/// Result of a hot-swap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwapOutcome {
    /// The new logic is live from the next decision on.
    Applied,
    /// The old logic is still live.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

impl SwapOutcome {
    /// Whether the swap was installed.
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Host handle to one agent's isolated execution context.
pub struct AgentSandbox {
    agent: AgentId,
    limits: SandboxLimits,
    tx: mpsc::Sender<Command>,
    next_request: AtomicU64,
    stats: Arc<SandboxStats>,
    worker: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for AgentSandbox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentSandbox")
            .field("agent", &self.agent)
            .field("limits", &self.limits)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

fn deadline_after(bound: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(bound).unwrap_or(now)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl AgentSandbox {
    /// Create an execution context for `agent` and load `source` into it.
    ///
    /// Fails when the source does not pass containment, does not compile,
    /// lacks the entry point, or the context does not become ready within
    /// the swap bound. At match setup any failure is fatal.
    pub async fn initialize(
        agent: AgentId,
        source: &str,
        limits: SandboxLimits,
    ) -> Result<Self, SandboxError> {
        containment::check(source, limits.max_source_bytes)?;

        let (tx, rx) = mpsc::channel(limits.queue_depth.max(1));
        let (ready_tx, ready_rx) = oneshot::channel();
        let bound = limits.swap_timeout();
        let ready_deadline = deadline_after(bound);

        let worker_limits = limits.clone();
        let worker_source = source.to_owned();
        let handle = std::thread::Builder::new()
            .name(format!("sandbox-{agent}"))
            .spawn(move || {
                context::run(agent, &worker_limits, &worker_source, ready_deadline, rx, ready_tx);
            })?;

        let waited = bound.saturating_add(SWAP_GRACE);
        match tokio::time::timeout(waited, ready_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => return Err(err),
            Ok(Err(_closed)) => {
                return Err(SandboxError::Unavailable {
                    reason: "context exited during startup",
                });
            }
            Err(_elapsed) => {
                return Err(SandboxError::Timeout {
                    waited_ms: millis(waited),
                });
            }
        }

        info!(
            agent = %agent,
            decision_timeout_ms = limits.decision_timeout_ms,
            "sandbox: initialized"
        );
        Ok(Self {
            agent,
            limits,
            tx,
            next_request: AtomicU64::new(0),
            stats: Arc::new(SandboxStats::default()),
            worker: Some(handle),
        })
    }

    /// The agent this context decides for.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Configured limits.
    pub const fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Current counters.
    pub fn stats(&self) -> SandboxStatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared handle to the live counters, for readers outside the match.
    pub fn stats_handle(&self) -> Arc<SandboxStats> {
        Arc::clone(&self.stats)
    }

    /// Ask the loaded logic for a decision.
    ///
    /// Returns within the per-decision bound. Timeouts, script errors,
    /// malformed output, a full queue, and a closed context all produce
    /// [`Decision::NEUTRAL`]. A reply arriving after the bound is discarded.
    pub async fn decide(&self, request: &DecisionRequest) -> Decision {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let bound = self.limits.decision_timeout();
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = Command::Decide {
            request: Box::new(request.clone()),
            request_id,
            deadline: deadline_after(bound),
            reply: reply_tx,
        };

        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return self.fallback(request.tick, DecisionFault::Saturated),
            Err(TrySendError::Closed(_)) => return self.fallback(request.tick, DecisionFault::Closed),
        }

        match tokio::time::timeout(bound, reply_rx).await {
            Ok(Ok(reply)) if reply.request_id == request_id => match reply.result {
                Ok(decision) => {
                    self.stats.record_decision();
                    decision
                }
                Err(fault) => self.fallback(request.tick, fault),
            },
            Ok(Ok(_)) | Err(_) => self.fallback(request.tick, DecisionFault::Timeout),
            Ok(Err(_closed)) => self.fallback(request.tick, DecisionFault::Closed),
        }
    }

    fn fallback(&self, tick: u64, fault: DecisionFault) -> Decision {
        self.stats.record_fault(fault);
        match fault {
            DecisionFault::Timeout | DecisionFault::Saturated | DecisionFault::Closed => warn!(
                agent = %self.agent,
                tick,
                fault = %fault,
                "sandbox: decision fell back to neutral"
            ),
            DecisionFault::Runtime | DecisionFault::Malformed => debug!(
                agent = %self.agent,
                tick,
                fault = %fault,
                "sandbox: decision fell back to neutral"
            ),
        }
        Decision::NEUTRAL
    }

    /// Replace the loaded logic.
    ///
    /// The new source goes through containment on the host, then is compiled
    /// inside the context. It is installed only if that finishes before the
    /// swap bound; on any failure the previous logic stays live. The reported
    /// outcome always matches what the context did: a swap installed just
    /// as the host stops waiting is still reported as applied.
    pub async fn hot_swap(&self, source: &str) -> SwapOutcome {
        if let Err(err) = containment::check(source, self.limits.max_source_bytes) {
            return self.rejected(&err);
        }

        let bound = self.limits.swap_timeout();
        let (reply_tx, reply_rx) = oneshot::channel();
        let ticket = Arc::new(SwapTicket::default());
        let command = Command::Swap {
            source: source.to_owned(),
            deadline: deadline_after(bound),
            ticket: Arc::clone(&ticket),
            reply: reply_tx,
        };

        match tokio::time::timeout(bound, self.tx.send(command)).await {
            Ok(Ok(())) => {}
            Ok(Err(_closed)) => {
                return self.rejected(&SandboxError::Unavailable { reason: "context closed" });
            }
            Err(_elapsed) => {
                return self.rejected(&SandboxError::Unavailable { reason: "queue full" });
            }
        }

        let waited = bound.saturating_add(SWAP_GRACE);
        let result = match tokio::time::timeout(waited, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_closed)) if ticket.abandon() => Err(SandboxError::Unavailable { reason: "context closed" }),
            Err(_elapsed) if ticket.abandon() => Err(SandboxError::Timeout {
                waited_ms: millis(waited),
            }),
            // The context installed the logic; only its reply was late.
            Ok(Err(_)) | Err(_) => Ok(()),
        };

        match result {
            Ok(()) => {
                self.stats.record_swap(true);
                info!(agent = %self.agent, "sandbox: hot-swap applied");
                SwapOutcome::Applied
            }
            Err(err) => self.rejected(&err),
        }
    }

    fn rejected(&self, err: &SandboxError) -> SwapOutcome {
        self.stats.record_swap(false);
        warn!(agent = %self.agent, error = %err, "sandbox: hot-swap rejected");
        SwapOutcome::Rejected {
            reason: err.to_string(),
        }
    }

    /// Stop the context and release its thread.
    ///
    /// Waits at most the swap bound for the thread to exit. A context stuck
    /// past that is left to finish on its own: its next deadline check ends
    /// the running call and the closed queue ends the loop.
    pub async fn terminate(self) {
        let Self {
            agent, limits, tx, worker, ..
        } = self;
        let _ = tx.try_send(Command::Shutdown);
        drop(tx);

        let Some(handle) = worker else {
            return;
        };

        let join = tokio::task::spawn_blocking(move || handle.join().is_ok());
        match tokio::time::timeout(limits.swap_timeout(), join).await {
            Ok(Ok(true)) => debug!(agent = %agent, "sandbox: terminated"),
            Ok(Ok(false) | Err(_)) => warn!(agent = %agent, "sandbox: context thread panicked"),
            Err(_elapsed) => warn!(agent = %agent, "sandbox: context did not stop in time, detaching"),
        }
    }
}
