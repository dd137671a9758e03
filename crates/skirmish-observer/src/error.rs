//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use skirmish_core::control::ControlError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path named an agent that does not exist.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// No match is attached to the observer.
    #[error("no match is running")]
    NoMatch,

    /// The request targets a match that is not the running one.
    #[error("stale request: {0}")]
    Stale(String),

    /// A match control command failed.
    #[error(transparent)]
    Control(#[from] ControlError),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) | Self::UnknownAgent(_) => StatusCode::NOT_FOUND,
            Self::NoMatch => StatusCode::SERVICE_UNAVAILABLE,
            Self::Stale(_) => StatusCode::CONFLICT,
            Self::Control(err) => match err {
                ControlError::Closed { .. } => StatusCode::GONE,
                ControlError::Busy => StatusCode::TOO_MANY_REQUESTS,
                ControlError::NoAuthor => StatusCode::NOT_IMPLEMENTED,
                ControlError::Author { .. } => StatusCode::BAD_GATEWAY,
            },
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
