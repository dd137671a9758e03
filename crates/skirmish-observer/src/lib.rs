//! Observer API server for Skirmish matches.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming every tick
//!   publication via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the latest publication and sandbox counters
//! - **Control endpoints** for hot-swapping and evolving an agent's
//!   decision logic through the match handle
//! - **Minimal HTML page** (`GET /`) showing the match status
//!
//! # Architecture
//!
//! The observer only ever sees post-tick, read-only publications pushed by
//! the engine through [`ObserverState::publish`]. It never writes to match
//! state; the control endpoints queue commands on the
//! [`MatchHandle`](skirmish_core::control::MatchHandle), which the runner
//! applies between ticks.

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{ObserverServer, spawn_observer};
pub use state::ObserverState;
