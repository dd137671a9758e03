//! Match loop runner with external controls.
//!
//! This module provides [`run_match`], the top-level async function that
//! drives the tick loop with support for:
//!
//! - **Bounded matches**: stop on knockout or at `max_ticks`
//! - **Fixed cadence**: sleep the configured interval between ticks
//! - **Hot-swaps between ticks**: queued swaps are applied before the next
//!   tick starts, so a confirmed swap changes decisions from that tick on
//! - **Stop requests**: a clean stop after the current tick
//! - **Stale command rejection**: commands for another match are discarded
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_sandbox::SwapOutcome;
use skirmish_types::{AgentId, MatchId, MatchOutcome, TickPublication};
use tracing::{info, warn};

use crate::control::{ControlCommand, MatchControl, SwapCommand, SwapReport};
use crate::decision::DecisionSource;
use crate::tick::{self, MatchState, TickError, TickSummary};

/// Errors that can occur during the match run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEnd {
    /// The match reached an outcome.
    Finished,
    /// A stop was requested before an outcome.
    Stopped,
}

/// Result of a match run.
#[derive(Debug)]
pub struct MatchResult {
    /// The match that ran.
    pub match_id: MatchId,
    /// Why the loop returned.
    pub end: MatchEnd,
    /// Outcome, if the match finished.
    pub outcome: Option<MatchOutcome>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// The last publication, if any tick completed.
    pub final_publication: Option<TickPublication>,
}

/// Callback invoked after each tick completes.
///
/// Implementations can use this to update the observer snapshot,
/// broadcast publications, etc.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run the match loop until it finishes or a stop is requested.
///
/// # Arguments
///
/// * `state` - Mutable match state
/// * `source` - Source of agent decisions (sandboxes, scripted, stub)
/// * `control` - Runner end of the match control channel
/// * `callback` - Called after each tick for observer updates
/// * `tick_interval` - Pause between ticks (zero runs flat out)
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_match(
    state: &mut MatchState,
    source: &mut dyn DecisionSource,
    control: &mut MatchControl,
    callback: &mut dyn TickCallback,
    tick_interval: Duration,
) -> Result<MatchResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut final_publication: Option<TickPublication> = None;

    info!(
        match_id = %state.match_id,
        max_ticks = state.store.max_ticks(),
        tick_interval_ms = u64::try_from(tick_interval.as_millis()).unwrap_or(u64::MAX),
        "Match starting"
    );

    let end = loop {
        // --- Control commands (between ticks only) ---
        if apply_commands(state, source, control).await {
            info!(match_id = %state.match_id, tick = state.store.tick(), "Stop requested");
            break MatchEnd::Stopped;
        }

        // --- Execute tick ---
        let summary = tick::run_tick(state, source).await?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary);

        let finished = summary.outcome.is_some();
        final_publication = Some(summary.publication);
        if finished {
            break MatchEnd::Finished;
        }

        // --- Sleep for tick interval ---
        if !tick_interval.is_zero() {
            tokio::time::sleep(tick_interval).await;
        }
    };

    control.close();
    // Anything still queued is answered so no requester waits forever.
    while let Some(command) = control.try_next() {
        if let ControlCommand::Swap(swap) = command {
            reply_rejected(swap, state.store.tick(), "match has ended");
        }
    }

    let result = MatchResult {
        match_id: state.match_id,
        end,
        outcome: state.store.outcome(),
        total_ticks,
        final_publication,
    };
    log_match_end(&result);
    Ok(result)
}

/// Drain queued commands. Returns `true` if a stop for this match was
/// among them.
async fn apply_commands(
    state: &MatchState,
    source: &mut dyn DecisionSource,
    control: &mut MatchControl,
) -> bool {
    let mut stop = false;
    while let Some(command) = control.try_next() {
        match command {
            ControlCommand::Stop { match_id } if match_id == state.match_id => stop = true,
            ControlCommand::Stop { match_id } => {
                warn!(stale = %match_id, current = %state.match_id, "discarding stop for another match");
            }
            ControlCommand::Swap(swap) if swap.match_id != state.match_id => {
                warn!(stale = %swap.match_id, current = %state.match_id, "discarding swap for another match");
                reply_rejected(swap, state.store.tick(), "request was issued for another match");
            }
            ControlCommand::Swap(swap) => {
                let outcome = source.hot_swap(swap.agent, &swap.source).await;
                info!(
                    match_id = %state.match_id,
                    agent = %swap.agent,
                    tick = state.store.tick(),
                    applied = outcome.is_applied(),
                    "Hot-swap processed"
                );
                let _ = swap.reply.send(SwapReport {
                    match_id: state.match_id,
                    agent: swap.agent,
                    outcome,
                    after_tick: state.store.tick(),
                });
            }
        }
    }
    stop
}

fn reply_rejected(swap: SwapCommand, tick: u64, reason: &str) {
    let _ = swap.reply.send(SwapReport {
        match_id: swap.match_id,
        agent: swap.agent,
        outcome: SwapOutcome::Rejected {
            reason: reason.to_owned(),
        },
        after_tick: tick,
    });
}

/// Log the match end sequence.
pub fn log_match_end(result: &MatchResult) {
    info!(
        match_id = %result.match_id,
        end = ?result.end,
        total_ticks = result.total_ticks,
        winner = result.outcome.and_then(|o| o.winner).map(AgentId::as_str),
        reason = ?result.outcome.map(|o| o.reason),
        "Match ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skirmish_types::{ArenaConfig, PerAgent, Rules};
    use skirmish_world::EntityStore;

    use super::*;
    use crate::control::control_channel;
    use crate::decision::StubDecisionSource;

    fn setup(max_ticks: u64) -> (MatchState, crate::control::MatchHandle, MatchControl) {
        let store = EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), max_ticks, 1).unwrap();
        let state = MatchState::new(store);
        let (handle, control) = control_channel(
            state.match_id,
            PerAgent::new("a".to_owned(), "b".to_owned()),
            None,
            8,
        );
        (state, handle, control)
    }

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, _summary: &TickSummary) {
            self.0 = self.0.saturating_add(1);
        }
    }

    #[tokio::test]
    async fn runs_to_the_tick_limit() {
        let (mut state, _handle, mut control) = setup(5);
        let mut counter = Counter(0);
        let result = run_match(
            &mut state,
            &mut StubDecisionSource::new(),
            &mut control,
            &mut counter,
            Duration::ZERO,
        )
        .await
        .unwrap();
        assert_eq!(result.end, MatchEnd::Finished);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(counter.0, 5);
        assert_eq!(result.outcome.map(|o| o.tick), Some(5));
        assert!(result.final_publication.is_some());
    }

    #[tokio::test]
    async fn stop_request_ends_before_the_next_tick() {
        let (mut state, handle, mut control) = setup(5);
        handle.request_stop().unwrap();
        let result = run_match(
            &mut state,
            &mut StubDecisionSource::new(),
            &mut control,
            &mut NoOpCallback,
            Duration::ZERO,
        )
        .await
        .unwrap();
        assert_eq!(result.end, MatchEnd::Stopped);
        assert_eq!(result.total_ticks, 0);
        assert!(result.outcome.is_none());
    }

    #[tokio::test]
    async fn swap_for_another_match_is_rejected() {
        let (mut state, handle, mut control) = setup(3);
        let stale = MatchId::new();
        let pending = tokio::spawn({
            let handle = handle.clone();
            async move { handle.swap_for(stale, AgentId::Alpha, String::new()).await }
        });
        tokio::task::yield_now().await;
        run_match(
            &mut state,
            &mut StubDecisionSource::new(),
            &mut control,
            &mut NoOpCallback,
            Duration::ZERO,
        )
        .await
        .unwrap();
        let report = pending.await.unwrap().unwrap();
        assert_eq!(report.match_id, stale);
        assert!(!report.outcome.is_applied());
    }

    #[tokio::test]
    async fn commands_after_the_match_fail_fast() {
        let (mut state, handle, mut control) = setup(1);
        run_match(
            &mut state,
            &mut StubDecisionSource::new(),
            &mut control,
            &mut NoOpCallback,
            Duration::ZERO,
        )
        .await
        .unwrap();
        let err = handle.swap(AgentId::Bravo, String::new()).await;
        assert!(matches!(err, Err(crate::control::ControlError::Closed { .. })));
    }
}
