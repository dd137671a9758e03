//! Decision source trait and its implementations.
//!
//! Each tick the scheduler freezes one [`DecisionRequest`] per agent and
//! asks a [`DecisionSource`] for both decisions. The trait abstracts where
//! decisions come from: sandboxed scripts in a real match, a closure in
//! tests, or a stub that always stands still.
//!
//! A source never fails. Anything that goes wrong for one agent becomes
//! [`Decision::NEUTRAL`] for that agent.

use std::sync::Arc;

use futures::future::BoxFuture;
use skirmish_sandbox::{AgentSandbox, SandboxStats, SwapOutcome};
use skirmish_types::{AgentId, Decision, DecisionRequest, PerAgent};

/// A source of agent decisions.
pub trait DecisionSource: Send {
    /// Produce both agents' decisions for one tick.
    ///
    /// The requests are read-only snapshots of the same tick, so
    /// implementations may evaluate them concurrently.
    fn decide<'a>(
        &'a mut self,
        requests: &'a PerAgent<DecisionRequest>,
    ) -> BoxFuture<'a, PerAgent<Decision>>;

    /// Replace one agent's decision logic. Sources without replaceable
    /// logic reject every swap.
    fn hot_swap<'a>(&'a mut self, agent: AgentId, source: &'a str) -> BoxFuture<'a, SwapOutcome> {
        let _ = (agent, source);
        Box::pin(async {
            SwapOutcome::Rejected {
                reason: "decision source does not support hot-swap".to_owned(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Stub
// ---------------------------------------------------------------------------

/// A stub decision source: both agents always stand still.
#[derive(Debug, Clone, Default)]
pub struct StubDecisionSource;

impl StubDecisionSource {
    /// Create a new stub decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for StubDecisionSource {
    fn decide<'a>(
        &'a mut self,
        _requests: &'a PerAgent<DecisionRequest>,
    ) -> BoxFuture<'a, PerAgent<Decision>> {
        Box::pin(async { PerAgent::new(Decision::NEUTRAL, Decision::NEUTRAL) })
    }
}

// ---------------------------------------------------------------------------
// Scripted (in-process)
// ---------------------------------------------------------------------------

type Policy = Box<dyn FnMut(AgentId, &DecisionRequest) -> Decision + Send>;

/// Decisions computed by a host-side closure. Deterministic and instant,
/// which makes it the source of choice for simulation tests.
pub struct ScriptedDecisionSource {
    policy: Policy,
}

impl ScriptedDecisionSource {
    /// Wrap a policy closure. It is called for alpha, then bravo.
    pub fn new(policy: impl FnMut(AgentId, &DecisionRequest) -> Decision + Send + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }
}

impl core::fmt::Debug for ScriptedDecisionSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScriptedDecisionSource").finish_non_exhaustive()
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn decide<'a>(
        &'a mut self,
        requests: &'a PerAgent<DecisionRequest>,
    ) -> BoxFuture<'a, PerAgent<Decision>> {
        let decisions = PerAgent::from_fn(|id| (self.policy)(id, requests.get(id)));
        Box::pin(async move { decisions })
    }
}

// ---------------------------------------------------------------------------
// Sandboxed scripts
// ---------------------------------------------------------------------------

/// Decisions from each agent's sandboxed script.
#[derive(Debug)]
pub struct SandboxDecisionSource {
    sandboxes: PerAgent<AgentSandbox>,
}

impl SandboxDecisionSource {
    /// Take ownership of both agents' execution contexts.
    pub const fn new(sandboxes: PerAgent<AgentSandbox>) -> Self {
        Self { sandboxes }
    }

    /// Live counter handles for both contexts.
    pub fn stats_handles(&self) -> PerAgent<Arc<SandboxStats>> {
        self.sandboxes.map(|_, sandbox| sandbox.stats_handle())
    }

    /// Release both execution contexts.
    pub async fn terminate(self) {
        let PerAgent { alpha, bravo } = self.sandboxes;
        tokio::join!(alpha.terminate(), bravo.terminate());
    }
}

impl DecisionSource for SandboxDecisionSource {
    fn decide<'a>(
        &'a mut self,
        requests: &'a PerAgent<DecisionRequest>,
    ) -> BoxFuture<'a, PerAgent<Decision>> {
        Box::pin(async move {
            let (alpha, bravo) = tokio::join!(
                self.sandboxes.alpha.decide(&requests.alpha),
                self.sandboxes.bravo.decide(&requests.bravo),
            );
            PerAgent::new(alpha, bravo)
        })
    }

    fn hot_swap<'a>(&'a mut self, agent: AgentId, source: &'a str) -> BoxFuture<'a, SwapOutcome> {
        Box::pin(async move { self.sandboxes.get(agent).hot_swap(source).await })
    }
}
