//! Shared application state for the Observer API server.
//!
//! [`ObserverState`] holds the broadcast channel for tick publications, the
//! most recent publication (served by the REST endpoints), and the optional
//! match handle and sandbox counters attached by the engine. The observer
//! only ever reads match state; changes go through the [`MatchHandle`].

use std::sync::Arc;

use skirmish_core::control::MatchHandle;
use skirmish_sandbox::SandboxStats;
use skirmish_types::{PerAgent, TickPublication};
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for tick publications.
///
/// A subscriber that falls behind by more than this many messages receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
pub const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct ObserverState {
    /// Broadcast sender for tick publications.
    pub tx: broadcast::Sender<TickPublication>,
    /// The latest publication, `None` before the first tick.
    pub latest: Arc<RwLock<Option<TickPublication>>>,
    /// Control handle of the running match, if any.
    pub control: Option<MatchHandle>,
    /// Live sandbox counters of the running match, if any.
    pub sandbox_stats: Option<PerAgent<Arc<SandboxStats>>>,
}

impl core::fmt::Debug for ObserverState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverState")
            .field("subscribers", &self.tx.receiver_count())
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

impl ObserverState {
    /// Create a state with no match attached.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            latest: Arc::new(RwLock::new(None)),
            control: None,
            sandbox_stats: None,
        }
    }

    /// Create a state attached to a running match.
    pub fn with_match(control: MatchHandle, sandbox_stats: Option<PerAgent<Arc<SandboxStats>>>) -> Self {
        Self {
            control: Some(control),
            sandbox_stats,
            ..Self::new()
        }
    }

    /// Subscribe to the publication stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TickPublication> {
        self.tx.subscribe()
    }

    /// Record and broadcast one tick's publication. Returns the number of
    /// subscribers that received it.
    ///
    /// Never blocks: if a reader holds the lock, the stored copy is left
    /// for the next tick to refresh. Subscribers always get the message.
    pub fn publish(&self, publication: &TickPublication) -> usize {
        if let Ok(mut latest) = self.latest.try_write() {
            *latest = Some(publication.clone());
        }
        // send fails only when nobody is subscribed.
        self.tx.send(publication.clone()).unwrap_or(0)
    }
}

impl Default for ObserverState {
    fn default() -> Self {
        Self::new()
    }
}
