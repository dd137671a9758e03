//! Observer HTTP server lifecycle management.
//!
//! [`bind`] resolves and binds the listening socket so configuration
//! mistakes surface at startup, and [`serve`] runs the router on an
//! already-bound listener until the task is aborted.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::ObserverState;

/// Configuration for the Observer server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
        }
    }
}

/// Errors that can occur when starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured host and port do not form a socket address.
    #[error("invalid listen address {addr}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
    },

    /// Failed to bind to the network address.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The server encountered a fatal error while serving.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Resolve and bind the configured address.
///
/// # Errors
///
/// Returns [`ServerError::InvalidAddress`] if the address does not parse
/// and [`ServerError::Bind`] if the socket cannot be bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let raw = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = raw
        .parse()
        .map_err(move |_parse| ServerError::InvalidAddress { addr: raw })?;

    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve the Observer API on a bound listener.
///
/// Runs until the task is aborted or the listener fails.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<ObserverState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer server listening");
    }
    axum::serve(listener, build_router(state))
        .await
        .map_err(|source| ServerError::Serve { source })
}
