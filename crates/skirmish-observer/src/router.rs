//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::ObserverState;
use crate::{control, handlers, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/ticks` -- `WebSocket` tick publication stream
/// - `GET /api/match` -- latest tick publication
/// - `GET /api/sandbox` -- per-agent sandbox statistics
/// - `POST /api/agents/{agent}/swap` -- hot-swap decision logic
/// - `POST /api/agents/{agent}/evolve` -- request evolved decision logic
///
/// CORS allows any origin so a dashboard can be served from elsewhere.
pub fn build_router(state: Arc<ObserverState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/ticks", get(ws::ws_ticks))
        // Read-only API
        .route("/api/match", get(handlers::get_match))
        .route("/api/sandbox", get(handlers::get_sandbox))
        // Match control
        .route("/api/agents/{agent}/swap", post(control::swap))
        .route("/api/agents/{agent}/evolve", post(control::evolve))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
