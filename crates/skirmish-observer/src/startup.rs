//! Observer server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds the listener eagerly, so a port conflict fails
//! match setup instead of a background task, then serves on a spawned
//! Tokio task alongside the match loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::server::{self, ServerConfig, ServerError};
use crate::state::ObserverState;

/// A running observer server.
#[derive(Debug)]
pub struct ObserverServer {
    /// The address actually bound.
    pub addr: SocketAddr,
    /// The serving task. Abort it on shutdown.
    pub task: JoinHandle<()>,
}

/// Bind the Observer server and start serving on a background task.
///
/// # Errors
///
/// Returns [`ServerError`] if the address is invalid or cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<ObserverState>,
) -> Result<ObserverServer, ServerError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|source| ServerError::Serve { source })?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            error!(error = %e, "Observer server exited with error");
        }
    });

    info!(%addr, "Observer server spawned on background task");
    Ok(ObserverServer { addr, task })
}
