//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Control endpoints are exercised against a real
//! match runner on a background task.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::future::BoxFuture;
use serde_json::Value;
use skirmish_core::author::{AuthorError, BotAuthor, Evolution, EvolutionRequest, GeneratedBot};
use skirmish_core::control::{MatchHandle, control_channel};
use skirmish_core::decision::DecisionSource;
use skirmish_core::runner::{MatchResult, NoOpCallback, run_match};
use skirmish_core::tick::{MatchState, run_tick};
use skirmish_observer::build_router;
use skirmish_observer::state::ObserverState;
use skirmish_sandbox::{SandboxStats, SwapOutcome};
use skirmish_types::{AgentId, ArenaConfig, Decision, DecisionRequest, MatchId, PerAgent, Rules};
use skirmish_world::EntityStore;
use tokio::task::JoinHandle;
use tower::ServiceExt;

// =========================================================================
// Fixtures
// =========================================================================

/// Accepts any source that mentions the entry point.
struct PermissiveSource;

impl DecisionSource for PermissiveSource {
    fn decide<'a>(&'a mut self, _requests: &'a PerAgent<DecisionRequest>) -> BoxFuture<'a, PerAgent<Decision>> {
        Box::pin(async { PerAgent::new(Decision::NEUTRAL, Decision::NEUTRAL) })
    }

    fn hot_swap<'a>(&'a mut self, _agent: AgentId, source: &'a str) -> BoxFuture<'a, SwapOutcome> {
        let outcome = if source.contains("fn decide") {
            SwapOutcome::Applied
        } else {
            SwapOutcome::Rejected {
                reason: "missing entry point".to_owned(),
            }
        };
        Box::pin(async move { outcome })
    }
}

struct FixedAuthor;

impl BotAuthor for FixedAuthor {
    fn create<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<GeneratedBot, AuthorError>> {
        Box::pin(async move {
            Err(AuthorError::NotFound {
                name: name.to_owned(),
            })
        })
    }

    fn evolve<'a>(&'a self, _request: &'a EvolutionRequest) -> BoxFuture<'a, Result<Evolution, AuthorError>> {
        Box::pin(async {
            Ok(Evolution {
                source: "fn decide(me, enemies, arena) { #{} }".to_owned(),
                narrative: "stands still".to_owned(),
            })
        })
    }
}

fn store(max_ticks: u64) -> EntityStore {
    EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), max_ticks, 7).unwrap()
}

struct Running {
    state: Arc<ObserverState>,
    handle: MatchHandle,
    runner: JoinHandle<MatchResult>,
}

impl Running {
    async fn stop(self) -> MatchResult {
        self.handle.request_stop().unwrap();
        self.runner.await.unwrap()
    }
}

/// Start a long match on a background task with the observer attached.
fn start_match(author: Option<Arc<dyn BotAuthor>>) -> Running {
    let mut match_state = MatchState::new(store(100_000));
    let (handle, mut control) = control_channel(
        match_state.match_id,
        PerAgent::new("brawler".to_owned(), "kiter".to_owned()),
        author,
        8,
    );
    let stats = PerAgent::new(Arc::new(SandboxStats::default()), Arc::new(SandboxStats::default()));
    let state = Arc::new(ObserverState::with_match(handle.clone(), Some(stats)));

    let runner = tokio::spawn(async move {
        let mut source = PermissiveSource;
        run_match(
            &mut match_state,
            &mut source,
            &mut control,
            &mut NoOpCallback,
            Duration::from_millis(2),
        )
        .await
        .unwrap()
    });

    Running { state, handle, runner }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Read-only endpoints
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(Arc::new(ObserverState::new()));

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_match_before_first_tick_is_not_found() {
    let router = build_router(Arc::new(ObserverState::new()));

    let response = router
        .oneshot(Request::get("/api/match").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_match_returns_latest_publication() {
    let state = Arc::new(ObserverState::new());
    let mut match_state = MatchState::new(store(10));
    let mut source = PermissiveSource;
    for _ in 0..3 {
        let summary = run_tick(&mut match_state, &mut source).await.unwrap();
        state.publish(&summary.publication);
    }

    let response = build_router(state)
        .oneshot(Request::get("/api/match").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["snapshot"]["tick"], 3);
    assert_eq!(json["snapshot"]["match_id"], match_state.match_id.to_string());
    assert!(json["positions"]["alpha"].is_object());
    assert!(json["events"].is_array());
}

#[tokio::test]
async fn test_publish_reaches_subscribers() {
    let state = ObserverState::new();
    let mut rx = state.subscribe();
    let mut match_state = MatchState::new(store(10));
    let summary = run_tick(&mut match_state, &mut PermissiveSource).await.unwrap();

    assert_eq!(state.publish(&summary.publication), 1);
    let received = rx.recv().await.unwrap();
    assert_eq!(received.snapshot.tick, 1);
}

#[tokio::test]
async fn test_sandbox_without_match_is_unavailable() {
    let router = build_router(Arc::new(ObserverState::new()));

    let response = router
        .oneshot(Request::get("/api/sandbox").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_sandbox_reports_both_agents() {
    let running = start_match(None);

    let response = build_router(Arc::clone(&running.state))
        .oneshot(Request::get("/api/sandbox").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["alpha"]["decisions"], 0);
    assert_eq!(json["bravo"]["timeouts"], 0);
    running.stop().await;
}

// =========================================================================
// Control endpoints
// =========================================================================

#[tokio::test]
async fn test_swap_applied() {
    let running = start_match(None);

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json(
            "/api/agents/alpha/swap",
            &serde_json::json!({ "source": "fn decide(me, enemies, arena) { #{} }" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["agent"], "alpha");
    assert_eq!(json["outcome"]["status"], "applied");
    assert_eq!(json["match_id"], running.handle.match_id().to_string());
    running.stop().await;
}

#[tokio::test]
async fn test_swap_rejected_keeps_running() {
    let running = start_match(None);

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json("/api/agents/bravo/swap", &serde_json::json!({ "source": "let x = 1;" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["outcome"]["status"], "rejected");
    assert_eq!(json["outcome"]["reason"], "missing entry point");

    let result = running.stop().await;
    assert!(result.total_ticks > 0);
}

#[tokio::test]
async fn test_swap_for_another_match_conflicts() {
    let running = start_match(None);
    let stale = MatchId::new();

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json(
            "/api/agents/alpha/swap",
            &serde_json::json!({
                "source": "fn decide(me, enemies, arena) { #{} }",
                "match_id": stale,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    running.stop().await;
}

#[tokio::test]
async fn test_swap_unknown_agent_not_found() {
    let running = start_match(None);

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json("/api/agents/charlie/swap", &serde_json::json!({ "source": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    running.stop().await;
}

#[tokio::test]
async fn test_swap_without_match_is_unavailable() {
    let router = build_router(Arc::new(ObserverState::new()));

    let response = router
        .oneshot(post_json("/api/agents/alpha/swap", &serde_json::json!({ "source": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_swap_after_match_end_is_gone() {
    let running = start_match(None);
    let state = Arc::clone(&running.state);
    running.stop().await;

    let response = build_router(state)
        .oneshot(post_json(
            "/api/agents/alpha/swap",
            &serde_json::json!({ "source": "fn decide(me, enemies, arena) { #{} }" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_evolve_without_author_not_implemented() {
    let running = start_match(None);

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json("/api/agents/alpha/evolve", &serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    running.stop().await;
}

#[tokio::test]
async fn test_evolve_is_accepted() {
    let running = start_match(Some(Arc::new(FixedAuthor)));

    let response = build_router(Arc::clone(&running.state))
        .oneshot(post_json(
            "/api/agents/bravo/evolve",
            &serde_json::json!({ "instruction": "keep your distance" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["agent"], "bravo");
    assert_eq!(json["status"], "accepted");

    running.handle.teardown();
    running.stop().await;
}
