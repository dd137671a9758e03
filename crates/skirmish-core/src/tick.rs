//! Tick cycle: the fixed-order step that drives a Skirmish match.
//!
//! Each tick runs through these phases:
//!
//! 1. **Begin** -- clear last tick's events, sweep inert entities, advance
//!    the tick counter, and record pre-tick positions.
//!
//! 2. **Decision** -- freeze a [`DecisionRequest`] per agent and ask the
//!    [`DecisionSource`] for both decisions (bounded, never failing).
//!
//! 3. **Resolution** -- for alpha then bravo: apply movement and facing,
//!    then the status tick and chosen ability.
//!
//! 4. **Physics** -- obstacle, bounds, and agent-agent collisions.
//!
//! 5. **Visibility** -- recompute sight and emit transition events.
//!
//! 6. **Entities** -- projectiles, then pickup spawn and collection, then
//!    trap triggers and expiry.
//!
//! 7. **Termination** -- knockout or time limit.
//!
//! 8. **Publish** -- assemble the [`TickPublication`] for observers.
//!
//! The tick is deterministic given the same initial store and the same
//! decisions. Only phase 2 suspends; every store mutation happens in the
//! synchronous part of the body.
//!
//! [`DecisionRequest`]: skirmish_types::DecisionRequest

use chrono::Utc;
use skirmish_agents::{ActionOutcome, resolve_agent};
use skirmish_types::{
    AgentId, Decision, EndReason, MatchId, MatchOutcome, PerAgent, TickPublication,
};
use skirmish_world::{
    EntityStore, WorldError, collision, movement, pickups, projectiles, traps, visibility,
};
use tracing::{debug, info};

use crate::decision::DecisionSource;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The match already has an outcome.
    #[error("match already finished on tick {tick}")]
    MatchFinished {
        /// Tick on which it ended.
        tick: u64,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow")]
    Overflow,

    /// Any other world failure.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        source: WorldError,
    },
}

impl From<WorldError> for TickError {
    fn from(source: WorldError) -> Self {
        match source {
            WorldError::MatchFinished { tick } => Self::MatchFinished { tick },
            WorldError::ArithmeticOverflow => Self::Overflow,
            other => Self::World { source: other },
        }
    }
}

/// The mutable state of one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    /// Identity of this match; stamped on every publication.
    pub match_id: MatchId,
    /// Canonical entity state.
    pub store: EntityStore,
}

impl MatchState {
    /// Wrap a freshly initialized store under a new match id.
    pub fn new(store: EntityStore) -> Self {
        Self {
            match_id: MatchId::new(),
            store,
        }
    }
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Decisions applied this tick.
    pub decisions: PerAgent<Decision>,
    /// What happened to each requested action.
    pub actions: PerAgent<ActionOutcome>,
    /// Set if the match ended on this tick.
    pub outcome: Option<MatchOutcome>,
    /// What observers receive.
    pub publication: TickPublication,
}

/// Execute one tick.
///
/// # Errors
///
/// Returns [`TickError::MatchFinished`] if the match already ended, or
/// [`TickError::Overflow`] if the tick counter would wrap. Nothing coming
/// from decision logic can produce an error here.
pub async fn run_tick(
    state: &mut MatchState,
    source: &mut dyn DecisionSource,
) -> Result<TickSummary, TickError> {
    let store = &mut state.store;

    // --- Begin ---
    let tick = store.begin_tick()?;
    let previous_positions = store.positions();

    // --- Decision ---
    let requests = PerAgent::from_fn(|id| store.decision_request(id));
    let decisions = source.decide(&requests).await;

    // --- Resolution ---
    let actions = PerAgent::from_fn(|id| {
        let decision = decisions.get(id);
        movement::apply(store, id, decision);
        resolve_agent(store, id, decision.action)
    });

    // --- Physics, visibility, entities ---
    collision::resolve(store);
    visibility::update(store);
    projectiles::advance(store);
    if let Some(at) = pickups::try_spawn(store) {
        debug!(tick, x = at.x, y = at.y, "pickup spawned");
    }
    pickups::collect(store);
    traps::resolve(store);
    let positions = store.positions();

    // --- Termination ---
    let outcome = evaluate_termination(store);
    if let Some(outcome) = outcome {
        store.finish(outcome);
        info!(
            tick,
            winner = outcome.winner.map_or("none", AgentId::as_str),
            reason = ?outcome.reason,
            "match ended"
        );
    }

    // --- Publish ---
    let publication = TickPublication {
        snapshot: store.snapshot(state.match_id),
        previous_positions,
        positions,
        events: store.events().to_vec(),
        published_at: Utc::now(),
    };

    debug!(
        tick,
        events = publication.events.len(),
        alpha_hp = publication.snapshot.agents.alpha.hp,
        bravo_hp = publication.snapshot.agents.bravo.hp,
        "tick complete"
    );

    Ok(TickSummary {
        tick,
        decisions,
        actions,
        outcome,
        publication,
    })
}

/// Decide whether the match ends this tick.
///
/// Any agent at zero hp ends it by knockout (a knockout event is emitted per
/// downed agent); both down at once is a draw. Otherwise reaching the tick
/// limit ends it with the healthier agent winning, or a draw on an exact
/// tie.
pub fn evaluate_termination(store: &mut EntityStore) -> Option<MatchOutcome> {
    let tick = store.tick();
    let down = store.record_knockouts();
    let winner = match (down.alpha, down.bravo) {
        (true, true) => Some(None),
        (true, false) => Some(Some(AgentId::Bravo)),
        (false, true) => Some(Some(AgentId::Alpha)),
        (false, false) => None,
    };
    if let Some(winner) = winner {
        return Some(MatchOutcome {
            winner,
            reason: EndReason::Knockout,
            tick,
        });
    }

    if tick < store.max_ticks() {
        return None;
    }
    let alpha = store.agent(AgentId::Alpha).hp;
    let bravo = store.agent(AgentId::Bravo).hp;
    let winner = match alpha.partial_cmp(&bravo) {
        Some(core::cmp::Ordering::Greater) => Some(AgentId::Alpha),
        Some(core::cmp::Ordering::Less) => Some(AgentId::Bravo),
        _ => None,
    };
    Some(MatchOutcome {
        winner,
        reason: EndReason::TimeLimit,
        tick,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skirmish_types::{Ability, ArenaConfig, EventKind, Rules, Vec2};

    use super::*;
    use crate::decision::{ScriptedDecisionSource, StubDecisionSource};

    fn state(max_ticks: u64) -> MatchState {
        let store = EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), max_ticks, 3).unwrap();
        MatchState::new(store)
    }

    #[tokio::test]
    async fn tick_advances_counter_and_publishes() {
        let mut s = state(10);
        let mut source = StubDecisionSource::new();
        let summary = run_tick(&mut s, &mut source).await.unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.publication.snapshot.tick, 1);
        assert_eq!(summary.publication.snapshot.match_id, s.match_id);
        assert_eq!(summary.actions.alpha, ActionOutcome::Idle);
        assert!(summary.outcome.is_none());
    }

    #[tokio::test]
    async fn movement_shows_in_previous_and_current_positions() {
        let mut s = state(10);
        let mut source = ScriptedDecisionSource::new(|id, _| match id {
            AgentId::Alpha => Decision::new(Vec2::new(1.0, 0.0), Vec2::ZERO, None),
            AgentId::Bravo => Decision::NEUTRAL,
        });
        let summary = run_tick(&mut s, &mut source).await.unwrap();
        let publication = summary.publication;
        assert!(publication.positions.alpha.x > publication.previous_positions.alpha.x);
        assert_eq!(publication.positions.bravo, publication.previous_positions.bravo);
    }

    #[tokio::test]
    async fn time_limit_with_equal_hp_is_a_draw() {
        let mut s = state(2);
        let mut source = StubDecisionSource::new();
        run_tick(&mut s, &mut source).await.unwrap();
        let summary = run_tick(&mut s, &mut source).await.unwrap();
        let outcome = summary.outcome.unwrap();
        assert_eq!(outcome.reason, EndReason::TimeLimit);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.tick, 2);
    }

    #[tokio::test]
    async fn tick_after_finish_is_an_error() {
        let mut s = state(1);
        let mut source = StubDecisionSource::new();
        run_tick(&mut s, &mut source).await.unwrap();
        let err = run_tick(&mut s, &mut source).await;
        assert!(matches!(err, Err(TickError::MatchFinished { tick: 1 })));
    }

    #[test]
    fn knockout_names_the_survivor() {
        let mut s = state(100);
        s.store.adjust_hp(AgentId::Bravo, -1_000.0);
        let outcome = evaluate_termination(&mut s.store).unwrap();
        assert_eq!(outcome.winner, Some(AgentId::Alpha));
        assert_eq!(outcome.reason, EndReason::Knockout);
        assert_eq!(
            s.store.events().iter().filter(|e| e.kind == EventKind::Knockout).count(),
            1
        );
    }

    #[test]
    fn double_knockout_is_a_draw() {
        let mut s = state(100);
        s.store.adjust_hp(AgentId::Alpha, -1_000.0);
        s.store.adjust_hp(AgentId::Bravo, -1_000.0);
        let outcome = evaluate_termination(&mut s.store).unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.reason, EndReason::Knockout);
    }

    #[test]
    fn time_limit_goes_to_the_healthier_agent() {
        let mut s = state(0);
        s.store.adjust_hp(AgentId::Alpha, -10.0);
        let outcome = evaluate_termination(&mut s.store).unwrap();
        assert_eq!(outcome.winner, Some(AgentId::Bravo));
        assert_eq!(outcome.reason, EndReason::TimeLimit);
    }

    #[tokio::test]
    async fn unused_ability_is_reported_idle_and_used_one_performed() {
        let mut s = state(10);
        let mut source = ScriptedDecisionSource::new(|id, _| match id {
            AgentId::Alpha => Decision::new(Vec2::ZERO, Vec2::ZERO, Some(Ability::Defend)),
            AgentId::Bravo => Decision::NEUTRAL,
        });
        let summary = run_tick(&mut s, &mut source).await.unwrap();
        assert_eq!(summary.actions.alpha, ActionOutcome::Performed(Ability::Defend));
        assert_eq!(summary.actions.bravo, ActionOutcome::Idle);
        assert!(summary.publication.events.iter().any(|e| e.kind == EventKind::DefendStart));
    }
}
