//! Match control endpoints: the only write paths the observer exposes.
//!
//! Both endpoints go through the [`MatchHandle`]; nothing here touches the
//! entity store. A swap blocks until the runner has processed it between
//! ticks. An evolution is accepted immediately and runs in the background.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/agents/{agent}/swap` | Replace an agent's decision logic |
//! | `POST` | `/api/agents/{agent}/evolve` | Ask the bot author for revised logic |
//!
//! [`MatchHandle`]: skirmish_core::control::MatchHandle

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use skirmish_core::control::MatchHandle;
use skirmish_types::{AgentId, MatchId};
use tracing::{info, warn};

use crate::error::ObserverError;
use crate::state::ObserverState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/agents/{agent}/swap`.
#[derive(Debug, serde::Deserialize)]
pub struct SwapRequest {
    /// Replacement decision-logic source.
    pub source: String,
    /// Match the caller believes is running. Defaults to the current one.
    pub match_id: Option<MatchId>,
}

/// Request body for `POST /api/agents/{agent}/evolve`.
#[derive(Debug, serde::Deserialize)]
pub struct EvolveRequest {
    /// Free-form guidance for the bot author.
    #[serde(default)]
    pub instruction: String,
}

/// Response for an accepted evolution request.
#[derive(Debug, serde::Serialize)]
struct EvolveAccepted {
    /// Match the evolution was issued for.
    match_id: MatchId,
    /// Agent being evolved.
    agent: AgentId,
    /// Always `"accepted"`.
    status: &'static str,
}

fn parse_agent(raw: &str) -> Result<AgentId, ObserverError> {
    AgentId::parse(raw).ok_or_else(|| ObserverError::UnknownAgent(raw.to_owned()))
}

fn control(state: &ObserverState) -> Result<&MatchHandle, ObserverError> {
    state.control.as_ref().ok_or(ObserverError::NoMatch)
}

// ---------------------------------------------------------------------------
// POST /api/agents/{agent}/swap
// ---------------------------------------------------------------------------

/// Hot-swap one agent's decision logic.
///
/// Returns `200` with the swap report when applied, `422` with the report
/// when the new source was rejected (the old logic keeps running), and
/// `409` when the request names a match other than the running one.
pub async fn swap(
    State(state): State<Arc<ObserverState>>,
    Path(agent): Path<String>,
    Json(body): Json<SwapRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let agent = parse_agent(&agent)?;
    let handle = control(&state)?;
    let match_id = body.match_id.unwrap_or_else(|| handle.match_id());

    let report = handle.swap_for(match_id, agent, body.source).await?;
    if report.match_id != handle.match_id() {
        return Err(ObserverError::Stale(format!(
            "match {} is not running (current is {})",
            report.match_id,
            handle.match_id()
        )));
    }

    let status = if report.outcome.is_applied() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(report)))
}

// ---------------------------------------------------------------------------
// POST /api/agents/{agent}/evolve
// ---------------------------------------------------------------------------

/// Start an evolution request for one agent. Returns `202` once the
/// request is queued; the outcome is logged when it completes.
pub async fn evolve(
    State(state): State<Arc<ObserverState>>,
    Path(agent): Path<String>,
    Json(body): Json<EvolveRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let agent = parse_agent(&agent)?;
    let handle = control(&state)?;

    let task = handle.evolve(agent, body.instruction)?;
    let match_id = handle.match_id();
    tokio::spawn(async move {
        match task.await {
            Ok(Ok(report)) => info!(
                match_id = %match_id,
                agent = %agent,
                applied = report.swap.outcome.is_applied(),
                "evolution finished"
            ),
            Ok(Err(err)) => warn!(match_id = %match_id, agent = %agent, error = %err, "evolution failed"),
            Err(err) if err.is_cancelled() => {
                info!(match_id = %match_id, agent = %agent, "evolution cancelled");
            }
            Err(err) => warn!(match_id = %match_id, agent = %agent, error = %err, "evolution task failed"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(EvolveAccepted {
            match_id,
            agent,
            status: "accepted",
        }),
    ))
}
