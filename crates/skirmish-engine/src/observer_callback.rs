//! Tick callback that feeds the Observer API.
//!
//! After each tick, the publication is stored as the latest state and
//! broadcast to all connected `WebSocket` clients.

use std::sync::Arc;

use skirmish_core::runner::TickCallback;
use skirmish_core::tick::TickSummary;
use skirmish_observer::ObserverState;
use skirmish_types::EventKind;
use tracing::{debug, info};

/// Callback that bridges the tick loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<ObserverState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given state.
    pub const fn new(state: Arc<ObserverState>) -> Self {
        Self { state }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        let receivers = self.state.publish(&summary.publication);
        debug!(tick = summary.tick, receivers, "publication sent");

        for event in summary
            .publication
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Knockout)
        {
            info!(tick = summary.tick, text = %event.text, "knockout");
        }
    }
}
