//! Read-only REST endpoint handlers for the Observer server.
//!
//! All handlers read from the latest [`TickPublication`] and the live
//! sandbox counters held by [`ObserverState`]. They never touch the entity
//! store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/match` | Latest tick publication |
//! | `GET` | `/api/sandbox` | Per-agent sandbox statistics |
//!
//! [`TickPublication`]: skirmish_types::TickPublication

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use skirmish_sandbox::SandboxStatsSnapshot;
use skirmish_types::{AgentId, PerAgent};

use crate::error::ObserverError;
use crate::state::ObserverState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the match status and API links.
pub async fn index(State(state): State<Arc<ObserverState>>) -> impl IntoResponse {
    let latest = state.latest.read().await;

    let match_id = state
        .control
        .as_ref()
        .map_or_else(|| "none".to_owned(), |c| c.match_id().to_string());
    let (tick, max_ticks) = latest
        .as_ref()
        .map_or((0, 0), |p| (p.snapshot.tick, p.snapshot.max_ticks));
    let status = match latest.as_ref().and_then(|p| p.snapshot.outcome) {
        Some(outcome) => match outcome.winner {
            Some(winner) => format!("FINISHED ({winner} wins, {:?})", outcome.reason),
            None => format!("FINISHED (draw, {:?})", outcome.reason),
        },
        None if latest.is_some() => "RUNNING".to_owned(),
        None => "WAITING".to_owned(),
    };

    let mut agents = String::new();
    for id in AgentId::ALL {
        let bot = state.control.as_ref().map_or("-", |c| c.bot(id));
        let (hp, energy) = latest.as_ref().map_or((0.0, 0.0), |p| {
            let agent = p.snapshot.agents.get(id);
            (agent.hp, agent.energy)
        });
        let _ = write!(
            agents,
            r#"
        <div class="metric">
            <div class="label">{id} ({bot})</div>
            <div class="value">{hp:.0} hp / {energy:.0} en</div>
        </div>"#
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Skirmish Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Skirmish Observer</h1>
    <p class="subtitle">Match {match_id}</p>

    <p>Status: <span class="status">{status}</span></p>

    <div>
        <div class="metric">
            <div class="label">Tick</div>
            <div class="value">{tick} / {max_ticks}</div>
        </div>{agents}
    </div>

    <h2>API</h2>
    <ul>
        <li>GET <a href="/api/match">/api/match</a></li>
        <li>GET <a href="/api/sandbox">/api/sandbox</a></li>
        <li>GET /ws/ticks (WebSocket)</li>
        <li>POST /api/agents/{{agent}}/swap</li>
        <li>POST /api/agents/{{agent}}/evolve</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/match
// ---------------------------------------------------------------------------

/// Return the latest tick publication.
pub async fn get_match(
    State(state): State<Arc<ObserverState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state.latest.read().await;
    let publication = latest
        .as_ref()
        .ok_or_else(|| ObserverError::NotFound("no tick has been published yet".to_owned()))?;
    Ok(Json(publication.clone()))
}

// ---------------------------------------------------------------------------
// GET /api/sandbox
// ---------------------------------------------------------------------------

/// Return each agent's sandbox counters.
pub async fn get_sandbox(
    State(state): State<Arc<ObserverState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let stats = state.sandbox_stats.as_ref().ok_or(ObserverError::NoMatch)?;
    let snapshot: PerAgent<SandboxStatsSnapshot> = stats.map(|_, s| s.snapshot());
    Ok(Json(snapshot))
}
