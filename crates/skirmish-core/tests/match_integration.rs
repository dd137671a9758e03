//! End-to-end match tests: the tick scheduler driven by scripted and
//! sandboxed decision sources, including between-tick hot-swaps.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use skirmish_core::control::control_channel;
use skirmish_core::decision::{DecisionSource, SandboxDecisionSource, ScriptedDecisionSource, StubDecisionSource};
use skirmish_core::runner::{MatchEnd, NoOpCallback, TickCallback, run_match};
use skirmish_core::tick::{MatchState, TickSummary, run_tick};
use skirmish_sandbox::{AgentSandbox, SandboxLimits};
use skirmish_types::{
    Ability, AgentId, ArenaConfig, Decision, DecisionRequest, EndReason, Event, EventKind, PerAgent, Rules, Vec2,
};
use skirmish_world::EntityStore;

fn state_with(rules: Rules, max_ticks: u64) -> MatchState {
    let store = EntityStore::new(ArenaConfig::open_field(20.0, 6.0), rules, max_ticks, 11).unwrap();
    MatchState::new(store)
}

fn state(max_ticks: u64) -> MatchState {
    state_with(Rules::default(), max_ticks)
}

/// Put both agents on the x axis, facing each other.
fn place(state: &mut MatchState, alpha_x: f64, bravo_x: f64) {
    let a = state.store.agent_mut(AgentId::Alpha);
    a.position = Vec2::new(alpha_x, 0.0);
    a.facing = Vec2::new(1.0, 0.0);
    let b = state.store.agent_mut(AgentId::Bravo);
    b.position = Vec2::new(bravo_x, 0.0);
    b.facing = Vec2::new(-1.0, 0.0);
}

fn only(action: Option<Ability>, actor: AgentId) -> ScriptedDecisionSource {
    ScriptedDecisionSource::new(move |id, _| {
        if id == actor {
            Decision::new(Vec2::ZERO, Vec2::ZERO, action)
        } else {
            Decision::NEUTRAL
        }
    })
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

fn chase(id: AgentId, req: &DecisionRequest) -> Decision {
    let me = req.self_view.position;
    let enemy = req.enemies.first().map_or(me, |e| e.position);
    let to_enemy = Vec2::new(enemy.x - me.x, enemy.y - me.y);
    let action = if to_enemy.length() < 2.0 {
        Some(Ability::Melee)
    } else if req.tick % 15 == 0 {
        Some(Ability::Ranged)
    } else if req.tick % 70 == 0 {
        Some(Ability::Trap)
    } else if id == AgentId::Bravo && req.tick % 9 == 0 {
        Some(Ability::Defend)
    } else {
        None
    };
    Decision::new(to_enemy, to_enemy, action)
}

// ---------------------------------------------------------------------------
// Determinism and termination
// ---------------------------------------------------------------------------

async fn run_recorded(ticks: u64) -> (Vec<Vec<Event>>, PerAgent<f64>) {
    let mut s = state(ticks);
    let mut source = ScriptedDecisionSource::new(chase);
    let mut log = Vec::new();
    while !s.store.is_finished() {
        let summary = run_tick(&mut s, &mut source).await.unwrap();
        log.push(summary.publication.events);
    }
    (log, s.store.agents().map(|_, a| a.hp))
}

#[tokio::test]
async fn identical_inputs_give_identical_matches() {
    let first = run_recorded(400).await;
    let second = run_recorded(400).await;
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert!(first.0.iter().flatten().any(|e| e.kind == EventKind::MeleeHit));
}

#[tokio::test]
async fn idle_match_to_time_limit_is_a_tie() {
    let mut s = state(30);
    let mut source = StubDecisionSource::new();
    let mut last = None;
    while !s.store.is_finished() {
        last = run_tick(&mut s, &mut source).await.unwrap().outcome;
    }
    let outcome = last.unwrap();
    assert_eq!(outcome.reason, EndReason::TimeLimit);
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.tick, 30);
}

// ---------------------------------------------------------------------------
// Combat scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aligned_melee_deals_exact_damage() {
    let mut s = state(100);
    place(&mut s, 0.0, 1.5);
    let mut source = only(Some(Ability::Melee), AgentId::Alpha);
    let summary = run_tick(&mut s, &mut source).await.unwrap();

    let expected = Rules::default().vitals.hp_max - Rules::default().combat.abilities.melee.damage;
    assert!((s.store.agent(AgentId::Bravo).hp - expected).abs() < 1e-9);
    assert_eq!(count(&summary.publication.events, EventKind::MeleeHit), 1);
}

#[tokio::test]
async fn melee_against_defender_is_reduced_and_rounded() {
    let mut s = state(100);
    place(&mut s, 0.0, 1.5);
    let mut source = ScriptedDecisionSource::new(|id, req| match id {
        AgentId::Alpha if req.tick >= 2 => Decision::new(Vec2::ZERO, Vec2::ZERO, Some(Ability::Melee)),
        AgentId::Alpha => Decision::NEUTRAL,
        AgentId::Bravo => Decision::new(Vec2::ZERO, Vec2::ZERO, Some(Ability::Defend)),
    });
    run_tick(&mut s, &mut source).await.unwrap();
    assert!(s.store.agent(AgentId::Bravo).defending);
    run_tick(&mut s, &mut source).await.unwrap();

    let rules = Rules::default();
    let reduced = (rules.combat.abilities.melee.damage * rules.combat.defend_reduction).round();
    assert!((s.store.agent(AgentId::Bravo).hp - (rules.vitals.hp_max - reduced)).abs() < 1e-9);
}

#[tokio::test]
async fn guard_from_previous_tick_does_not_reduce_damage() {
    let mut s = state(100);
    place(&mut s, 0.0, 1.5);
    let mut source = ScriptedDecisionSource::new(|id, req| match (id, req.tick) {
        (AgentId::Bravo, 1) => Decision::new(Vec2::ZERO, Vec2::ZERO, Some(Ability::Defend)),
        (AgentId::Alpha, 2) => Decision::new(Vec2::ZERO, Vec2::ZERO, Some(Ability::Melee)),
        _ => Decision::NEUTRAL,
    });
    run_tick(&mut s, &mut source).await.unwrap();
    assert!(s.store.agent(AgentId::Bravo).defending);
    let hp_before = s.store.agent(AgentId::Bravo).hp;

    let summary = run_tick(&mut s, &mut source).await.unwrap();
    let bravo = s.store.agent(AgentId::Bravo);
    let loss = hp_before - bravo.hp;
    assert!((loss - Rules::default().combat.abilities.melee.damage).abs() < 1e-9);
    assert!(!bravo.defending);
    assert_eq!(count(&summary.publication.events, EventKind::DefendEnd), 1);
    assert_eq!(count(&summary.publication.events, EventKind::MeleeHit), 1);
}

#[tokio::test]
async fn missed_swing_still_commits() {
    let mut s = state(100);
    let mut source = only(Some(Ability::Melee), AgentId::Alpha);
    let summary = run_tick(&mut s, &mut source).await.unwrap();

    let alpha = s.store.agent(AgentId::Alpha);
    assert_eq!(count(&summary.publication.events, EventKind::MeleeMiss), 1);
    assert!(alpha.status.commit_ticks > 0);
    assert!(alpha.momentum.abs() < f64::EPSILON);
    assert!(alpha.cooldowns.melee > 0);
    assert!((s.store.agent(AgentId::Bravo).hp - Rules::default().vitals.hp_max).abs() < 1e-9);
}

#[tokio::test]
async fn trap_over_cap_is_a_silent_no_op() {
    let mut rules = Rules::default();
    rules.traps.max_per_owner = 1;
    let mut s = state_with(rules, 100);
    let mut source = only(Some(Ability::Trap), AgentId::Alpha);

    let first = run_tick(&mut s, &mut source).await.unwrap();
    assert_eq!(count(&first.publication.events, EventKind::TrapPlaced), 1);
    s.store.agent_mut(AgentId::Alpha).cooldowns.trap = 0;
    let energy_before = s.store.agent(AgentId::Alpha).energy;

    let second = run_tick(&mut s, &mut source).await.unwrap();
    let alpha = s.store.agent(AgentId::Alpha);
    let regen = Rules::default().vitals.energy_regen_per_tick;
    assert_eq!(count(&second.publication.events, EventKind::TrapPlaced), 0);
    assert_eq!(alpha.cooldowns.trap, 0);
    assert!((alpha.energy - (energy_before + regen)).abs() < 1e-9);
    assert_eq!(s.store.active_trap_count(AgentId::Alpha), 1);
}

#[tokio::test]
async fn sight_events_fire_once_per_flip() {
    let mut s = state(100);
    let mut source = ScriptedDecisionSource::new(|id, req| match id {
        AgentId::Alpha if req.tick <= 2 => Decision::new(Vec2::ZERO, Vec2::new(-1.0, 0.0), None),
        AgentId::Alpha => Decision::new(Vec2::ZERO, Vec2::new(1.0, 0.0), None),
        AgentId::Bravo => Decision::NEUTRAL,
    });

    let t1 = run_tick(&mut s, &mut source).await.unwrap().publication.events;
    let t2 = run_tick(&mut s, &mut source).await.unwrap().publication.events;
    let t3 = run_tick(&mut s, &mut source).await.unwrap().publication.events;

    assert_eq!(count(&t1, EventKind::SightLost), 1);
    assert_eq!(count(&t2, EventKind::SightLost) + count(&t2, EventKind::SightGained), 0);
    assert_eq!(count(&t3, EventKind::SightGained), 1);

    // Bravo never turned, so it never flips.
    for events in [&t1, &t2, &t3] {
        assert!(events.iter().all(|e| e.attacker != Some(AgentId::Bravo)));
    }
}

// ---------------------------------------------------------------------------
// Sandboxed decisions
// ---------------------------------------------------------------------------

const CHASER: &str = r#"
    fn decide(me, enemies, arena) {
        let e = enemies[0];
        let dx = e.position.x - me.position.x;
        let dy = e.position.y - me.position.y;
        #{ move: [dx, dy], aim: [dx, dy], action: "melee" }
    }
"#;

const HEALER: &str = r#"
    fn decide(me, enemies, arena) {
        #{ move: [0.0, 0.0], aim: [0.0, 0.0], action: "heal" }
    }
"#;

const SPINNER: &str = r#"
    fn decide(me, enemies, arena) {
        let n = 0;
        loop { n += 1; }
    }
"#;

async fn sandboxes(alpha: &str, bravo: &str) -> SandboxDecisionSource {
    let limits = SandboxLimits {
        max_operations: 0,
        ..SandboxLimits::default()
    };
    let a = AgentSandbox::initialize(AgentId::Alpha, alpha, limits.clone()).await.unwrap();
    let b = AgentSandbox::initialize(AgentId::Bravo, bravo, limits).await.unwrap();
    SandboxDecisionSource::new(PerAgent::new(a, b))
}

#[tokio::test]
async fn hung_decision_is_neutral_and_bounded() {
    let mut s = state(100);
    let mut source = sandboxes(CHASER, SPINNER).await;
    let bound = SandboxLimits::default().decision_timeout();

    let started = Instant::now();
    let summary = run_tick(&mut s, &mut source).await.unwrap();
    let elapsed = started.elapsed();

    assert!(summary.decisions.bravo.is_neutral());
    assert_eq!(summary.decisions.alpha.action, Some(Ability::Melee));
    assert!(elapsed < bound.saturating_add(Duration::from_millis(150)), "tick took {elapsed:?}");
    assert_eq!(source.stats_handles().bravo.snapshot().timeouts, 1);
    source.terminate().await;
}

struct Recorder(Arc<Mutex<Vec<(u64, Option<Ability>)>>>);

impl TickCallback for Recorder {
    fn on_tick(&mut self, summary: &TickSummary) {
        if let Ok(mut log) = self.0.lock() {
            log.push((summary.tick, summary.decisions.alpha.action));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn swap_takes_effect_from_the_next_tick() {
    let mut s = state(10_000);
    let match_id = s.match_id;
    let (handle, mut control) = control_channel(
        match_id,
        PerAgent::new("chaser".to_owned(), "chaser".to_owned()),
        None,
        8,
    );
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut recorder = Recorder(Arc::clone(&log));

    let runner = tokio::spawn(async move {
        let mut source = sandboxes(CHASER, CHASER).await;
        let result = run_match(&mut s, &mut source, &mut control, &mut recorder, Duration::from_millis(2)).await;
        source.terminate().await;
        result
    });

    tokio::time::sleep(Duration::from_millis(60)).await;
    let rejected = handle.swap(AgentId::Alpha, "fn decide(me, enemies, arena) {".to_owned()).await.unwrap();
    assert!(!rejected.outcome.is_applied());
    let report = handle.swap(AgentId::Alpha, HEALER.to_owned()).await.unwrap();
    assert!(report.outcome.is_applied());
    tokio::time::sleep(Duration::from_millis(40)).await;
    handle.request_stop().unwrap();

    let result = runner.await.unwrap().unwrap();
    assert_eq!(result.end, MatchEnd::Stopped);

    let log = log.lock().unwrap();
    assert!(log.iter().any(|(tick, _)| *tick > report.after_tick));
    for (tick, action) in log.iter() {
        let expected = if *tick > report.after_tick { Ability::Heal } else { Ability::Melee };
        assert_eq!(*action, Some(expected), "tick {tick}");
    }
}

#[tokio::test]
async fn default_source_rejects_swaps_through_the_runner() {
    let mut s = state(3);
    let (handle, mut control) = control_channel(
        s.match_id,
        PerAgent::new("a".to_owned(), "b".to_owned()),
        None,
        4,
    );
    let pending = tokio::spawn(async move { handle.swap(AgentId::Alpha, CHASER.to_owned()).await });
    tokio::task::yield_now().await;
    let mut source: Box<dyn DecisionSource> = Box::new(StubDecisionSource::new());
    run_match(&mut s, source.as_mut(), &mut control, &mut NoOpCallback, Duration::ZERO)
        .await
        .unwrap();
    let report = pending.await.unwrap().unwrap();
    assert!(!report.outcome.is_applied());
}
