//! Host-level tests for [`AgentSandbox`]: bounded decisions, fallback to
//! the neutral action, containment at load, and atomic hot-swaps.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use skirmish_sandbox::{AgentSandbox, SandboxError, SandboxLimits, SwapOutcome};
use skirmish_types::{Ability, AgentId, ArenaConfig, Decision, DecisionRequest, Rules, Vec2};
use skirmish_world::EntityStore;

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
        #{ move: #{ x: 0.0, y: 1.0 }, aim: [0.0, 0.0], action: "heal" }
    }
"#;

const SPINNER: &str = r#"
    fn decide(me, enemies, arena) {
        let n = 0;
        loop { n += 1; }
    }
"#;

fn request() -> DecisionRequest {
    let store = EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), 100, 7).unwrap();
    store.decision_request(AgentId::Alpha)
}

async fn sandbox(source: &str) -> AgentSandbox {
    AgentSandbox::initialize(AgentId::Alpha, source, SandboxLimits::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn valid_logic_answers_with_its_decision() {
    let sb = sandbox(CHASER).await;
    let decision = sb.decide(&request()).await;
    // Alpha spawns at (-5, 0), bravo at (5, 0).
    assert_eq!(decision.move_dir, Vec2::new(10.0, 0.0));
    assert_eq!(decision.action, Some(Ability::Melee));
    assert_eq!(sb.stats().decisions, 1);
    sb.terminate().await;
}

#[tokio::test]
async fn runaway_logic_falls_back_to_neutral_within_bound() {
    let limits = SandboxLimits {
        max_operations: 0,
        ..SandboxLimits::default()
    };
    let sb = AgentSandbox::initialize(AgentId::Alpha, SPINNER, limits).await.unwrap();
    let bound = sb.limits().decision_timeout();

    let started = Instant::now();
    let decision = sb.decide(&request()).await;
    let elapsed = started.elapsed();

    assert_eq!(decision, Decision::NEUTRAL);
    assert!(elapsed < bound.saturating_add(Duration::from_millis(100)), "took {elapsed:?}");
    assert_eq!(sb.stats().timeouts, 1);

    // The context recovers for the next tick.
    assert!(sb.hot_swap(CHASER).await.is_applied());
    assert_eq!(sb.decide(&request()).await.action, Some(Ability::Melee));
    sb.terminate().await;
}

#[tokio::test]
async fn forbidden_source_is_rejected_at_load() {
    let source = "fn decide(me, enemies, arena) { sleep(10); #{} }";
    let err = AgentSandbox::initialize(AgentId::Bravo, source, SandboxLimits::default()).await;
    assert!(matches!(err, Err(SandboxError::Forbidden { .. })));
}

#[tokio::test]
async fn missing_entry_point_is_rejected_at_load() {
    let err = AgentSandbox::initialize(AgentId::Bravo, "fn think(me) { #{} }", SandboxLimits::default()).await;
    assert!(matches!(err, Err(SandboxError::MissingEntryPoint { .. })));
}

#[tokio::test]
async fn script_errors_and_malformed_output_are_neutral() {
    let sb = sandbox("fn decide(me, enemies, arena) { throw \"boom\"; }").await;
    assert_eq!(sb.decide(&request()).await, Decision::NEUTRAL);
    assert_eq!(sb.stats().runtime_faults, 1);

    assert!(sb.hot_swap("fn decide(me, enemies, arena) { 42 }").await.is_applied());
    assert_eq!(sb.decide(&request()).await, Decision::NEUTRAL);
    assert_eq!(sb.stats().malformed, 1);
    sb.terminate().await;
}

#[tokio::test]
async fn invalid_swap_keeps_previous_logic() {
    let sb = sandbox(CHASER).await;

    let outcome = sb.hot_swap("fn decide(me, enemies, arena) { ").await;
    assert!(matches!(outcome, SwapOutcome::Rejected { .. }));
    let outcome = sb.hot_swap("fn decide(me, enemies, arena) { fetch(1) }").await;
    assert!(matches!(outcome, SwapOutcome::Rejected { .. }));

    assert_eq!(sb.decide(&request()).await.action, Some(Ability::Melee));
    assert_eq!(sb.stats().swaps_rejected, 2);
    sb.terminate().await;
}

#[tokio::test]
async fn valid_swap_changes_later_decisions() {
    let sb = sandbox(CHASER).await;
    assert_eq!(sb.decide(&request()).await.action, Some(Ability::Melee));

    assert_eq!(sb.hot_swap(HEALER).await, SwapOutcome::Applied);
    let decision = sb.decide(&request()).await;
    assert_eq!(decision.action, Some(Ability::Heal));
    assert_eq!(decision.move_dir, Vec2::new(0.0, 1.0));
    assert_eq!(sb.stats().swaps_applied, 1);
    sb.terminate().await;
}

#[tokio::test]
async fn terminate_does_not_wait_on_a_running_script() {
    let limits = SandboxLimits {
        max_operations: 0,
        ..SandboxLimits::default()
    };
    let sb = AgentSandbox::initialize(AgentId::Alpha, SPINNER, limits).await.unwrap();
    let _ = sb.decide(&request()).await;

    let started = Instant::now();
    sb.terminate().await;
    assert!(started.elapsed() < Duration::from_millis(500));
}

/// Spins past the bound while at full health, answers at once otherwise.
const SLOW_WHEN_HEALTHY: &str = r#"
    fn decide(me, enemies, arena) {
        if me.hp >= me.hp_max {
            let n = 0;
            loop { n += 1; }
        }
        #{ move: [0.0, -1.0], aim: [0.0, 0.0], action: "heal" }
    }
"#;

#[tokio::test]
async fn late_reply_is_not_taken_for_the_next_request() {
    let limits = SandboxLimits {
        max_operations: 0,
        ..SandboxLimits::default()
    };
    let sb = AgentSandbox::initialize(AgentId::Alpha, SLOW_WHEN_HEALTHY, limits).await.unwrap();
    let slow = request();
    let mut fast = request();
    fast.self_view.hp = fast.self_view.hp_max / 2.0;

    for round in 1..=3_u64 {
        // The context is still finishing this call when the host gives up.
        assert_eq!(sb.decide(&slow).await, Decision::NEUTRAL);
        let answer = sb.decide(&fast).await;
        assert_eq!(answer.action, Some(Ability::Heal), "round {round}");
        assert_eq!(answer.move_dir, Vec2::new(0.0, -1.0));
        assert_eq!(sb.stats().timeouts, round);
        assert_eq!(sb.stats().decisions, round);
    }
    sb.terminate().await;
}
