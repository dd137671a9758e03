//! Live tick feed over `WebSocket`.
//!
//! `GET /ws/ticks` first replays the latest publication so a viewer that
//! joins mid-match can draw the arena immediately, then forwards every
//! later tick as a JSON [`TickPublication`] text frame. Ticks are sent in
//! increasing order only: the replayed publication may also still be
//! queued on the broadcast channel, and a lagging viewer skips ahead
//! instead of receiving stale ticks.
//!
//! Once a publication carrying the match outcome has been sent, the feed
//! closes with a normal close frame.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use skirmish_types::TickPublication;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::ObserverState;

/// `GET /ws/ticks`
pub async fn ws_ticks(ws: WebSocketUpgrade, State(state): State<Arc<ObserverState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_ticks(socket, state))
}

/// Remembers the last tick sent to one viewer.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TickCursor {
    last: Option<u64>,
}

impl TickCursor {
    /// Whether `tick` is newer than anything sent so far; advances the
    /// cursor when it is.
    pub(crate) fn admit(&mut self, tick: u64) -> bool {
        if self.last.is_some_and(|last| tick <= last) {
            return false;
        }
        self.last = Some(tick);
        true
    }
}

/// Why a feed stopped.
enum Stop {
    Disconnected,
    MatchOver,
}

async fn stream_ticks(mut socket: WebSocket, state: Arc<ObserverState>) {
    // Subscribe before reading the replay so no tick falls in between.
    let mut rx = state.subscribe();
    let mut cursor = TickCursor::default();
    debug!("tick feed opened");

    let replay = state.latest.read().await.clone();
    if let Some(publication) = replay {
        let sent = forward(&mut socket, &mut cursor, &publication).await;
        if let Err(stop) = sent {
            finish(socket, stop).await;
            return;
        }
    }

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(publication) => {
                    if let Err(stop) = forward(&mut socket, &mut cursor, &publication).await {
                        finish(socket, stop).await;
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "tick feed lagged, skipping ahead");
                }
                Err(RecvError::Closed) => {
                    debug!("publication channel closed");
                    return;
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    debug!("tick feed closed by viewer");
                    return;
                }
                // The feed is one-way.
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Send one publication if it is newer than the cursor.
async fn forward(socket: &mut WebSocket, cursor: &mut TickCursor, publication: &TickPublication) -> Result<(), Stop> {
    let tick = publication.snapshot.tick;
    if !cursor.admit(tick) {
        return Ok(());
    }
    match serde_json::to_string(publication) {
        Ok(json) => {
            if socket.send(Message::Text(json.into())).await.is_err() {
                return Err(Stop::Disconnected);
            }
        }
        Err(err) => warn!(tick, error = %err, "publication not serializable, dropped"),
    }
    if publication.snapshot.outcome.is_some() {
        return Err(Stop::MatchOver);
    }
    Ok(())
}

async fn finish(mut socket: WebSocket, stop: Stop) {
    match stop {
        Stop::Disconnected => debug!("tick feed viewer went away"),
        Stop::MatchOver => {
            let frame = CloseFrame {
                code: close_code::NORMAL,
                reason: "match over".into(),
            };
            if socket.send(Message::Close(Some(frame))).await.is_err() {
                debug!("viewer gone before close frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TickCursor;

    #[test]
    fn cursor_admits_only_newer_ticks() {
        let mut cursor = TickCursor::default();
        assert!(cursor.admit(5));
        assert!(!cursor.admit(5));
        assert!(!cursor.admit(3));
        assert!(cursor.admit(9));
        assert!(!cursor.admit(6));
    }

    #[test]
    fn first_tick_is_always_admitted() {
        assert!(TickCursor::default().admit(0));
    }
}
