//! Match control: the only way to influence a running match from outside.
//!
//! [`control_channel`] returns a [`MatchHandle`] (cloneable, handed to the
//! observer and the binary) and a [`MatchControl`] (owned by the runner).
//! Commands are queued and applied by the runner between ticks, never while
//! a tick body is executing.
//!
//! Every command carries the [`MatchId`] it was issued for. The runner
//! discards commands for any other match, so a late evolution result from a
//! previous match can never touch the current one. Teardown aborts all
//! outstanding evolution tasks and closes the queue.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use skirmish_sandbox::SwapOutcome;
use skirmish_types::{AgentId, MatchId, PerAgent};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::author::{BotAuthor, EvolutionRequest};

/// Errors returned by [`MatchHandle`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The match has ended or was torn down.
    #[error("match {match_id} is no longer running")]
    Closed {
        /// The match the command was for.
        match_id: MatchId,
    },

    /// The control queue is full.
    #[error("control queue is full")]
    Busy,

    /// No code-generation collaborator is attached.
    #[error("no bot author is configured")]
    NoAuthor,

    /// The collaborator failed.
    #[error("evolution failed: {source}")]
    Author {
        /// The underlying collaborator error.
        #[from]
        source: crate::author::AuthorError,
    },
}

/// A command queued for the runner.
#[derive(Debug)]
pub enum ControlCommand {
    /// End the match after the current tick.
    Stop {
        /// Match the stop was issued for.
        match_id: MatchId,
    },
    /// Replace one agent's decision logic.
    Swap(SwapCommand),
}

/// A queued hot-swap.
#[derive(Debug)]
pub struct SwapCommand {
    /// Match the swap was issued for.
    pub match_id: MatchId,
    /// Agent whose logic is replaced.
    pub agent: AgentId,
    /// New source text.
    pub source: String,
    /// Where the runner reports the result.
    pub reply: oneshot::Sender<SwapReport>,
}

/// Result of a hot-swap as seen by the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReport {
    /// Match the swap was applied to.
    pub match_id: MatchId,
    /// Agent whose logic was (or was not) replaced.
    pub agent: AgentId,
    /// Applied or rejected with a reason.
    pub outcome: SwapOutcome,
    /// Ticks completed when the swap was processed; an applied swap takes
    /// effect from the tick after this one.
    pub after_tick: u64,
}

/// Result of an evolution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionReport {
    /// The collaborator's narrative.
    pub narrative: String,
    /// What happened to the generated source.
    pub swap: SwapReport,
}

/// Runner-side end of the control channel.
#[derive(Debug)]
pub struct MatchControl {
    match_id: MatchId,
    rx: mpsc::Receiver<ControlCommand>,
}

impl MatchControl {
    /// Match this control belongs to.
    pub const fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Next queued command, if any, without waiting.
    pub fn try_next(&mut self) -> Option<ControlCommand> {
        self.rx.try_recv().ok()
    }

    /// Refuse further commands. Already queued commands can still be
    /// drained with [`try_next`](Self::try_next).
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Outside-facing handle to a running match.
#[derive(Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    bots: Arc<PerAgent<String>>,
    tx: mpsc::Sender<ControlCommand>,
    author: Option<Arc<dyn BotAuthor>>,
    evolutions: Arc<Mutex<Vec<AbortHandle>>>,
}

impl core::fmt::Debug for MatchHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MatchHandle")
            .field("match_id", &self.match_id)
            .field("bots", &self.bots)
            .field("has_author", &self.author.is_some())
            .finish_non_exhaustive()
    }
}

/// Create the control channel for one match.
pub fn control_channel(
    match_id: MatchId,
    bots: PerAgent<String>,
    author: Option<Arc<dyn BotAuthor>>,
    capacity: usize,
) -> (MatchHandle, MatchControl) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = MatchHandle {
        match_id,
        bots: Arc::new(bots),
        tx,
        author,
        evolutions: Arc::new(Mutex::new(Vec::new())),
    };
    (handle, MatchControl { match_id, rx })
}

impl MatchHandle {
    /// Match this handle controls.
    pub const fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Bot name for one agent.
    pub fn bot(&self, agent: AgentId) -> &str {
        self.bots.get(agent)
    }

    /// Ask the runner to stop after the current tick.
    pub fn request_stop(&self) -> Result<(), ControlError> {
        self.enqueue(ControlCommand::Stop {
            match_id: self.match_id,
        })
    }

    fn enqueue(&self, command: ControlCommand) -> Result<(), ControlError> {
        self.tx.try_send(command).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ControlError::Busy,
            mpsc::error::TrySendError::Closed(_) => ControlError::Closed {
                match_id: self.match_id,
            },
        })
    }

    /// Hot-swap one agent's logic in this match and wait for the result.
    pub async fn swap(&self, agent: AgentId, source: String) -> Result<SwapReport, ControlError> {
        self.swap_for(self.match_id, agent, source).await
    }

    /// Hot-swap on behalf of a request issued for `match_id`. If that is
    /// not the running match, the runner rejects it.
    pub async fn swap_for(
        &self,
        match_id: MatchId,
        agent: AgentId,
        source: String,
    ) -> Result<SwapReport, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(ControlCommand::Swap(SwapCommand {
            match_id,
            agent,
            source,
            reply,
        }))?;
        rx.await.map_err(|err| {
            warn!(match_id = %match_id, error = %err, "swap dropped before it was processed");
            ControlError::Closed { match_id }
        })
    }

    /// Ask the code-generation collaborator for revised logic and swap it
    /// in. Runs in the background; the task is aborted on teardown.
    pub fn evolve(
        &self,
        agent: AgentId,
        instruction: String,
    ) -> Result<JoinHandle<Result<EvolutionReport, ControlError>>, ControlError> {
        let author = self.author.clone().ok_or(ControlError::NoAuthor)?;
        let request = EvolutionRequest {
            match_id: self.match_id,
            agent,
            bot: self.bot(agent).to_owned(),
            instruction,
        };
        let handle = self.clone();
        let task = tokio::spawn(async move {
            let evolution = author.evolve(&request).await?;
            info!(
                match_id = %request.match_id,
                agent = %agent,
                narrative = %evolution.narrative,
                "evolution received"
            );
            let swap = handle.swap_for(request.match_id, agent, evolution.source).await?;
            Ok(EvolutionReport {
                narrative: evolution.narrative,
                swap,
            })
        });

        let mut evolutions = self.evolutions.lock().unwrap_or_else(PoisonError::into_inner);
        evolutions.retain(|h| !h.is_finished());
        evolutions.push(task.abort_handle());
        Ok(task)
    }

    /// Abort every outstanding evolution request.
    pub fn teardown(&self) {
        let pending: Vec<AbortHandle> = self
            .evolutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let aborted = pending.iter().filter(|h| !h.is_finished()).count();
        for handle in pending {
            handle.abort();
        }
        info!(match_id = %self.match_id, aborted, "match handle torn down");
    }
}
