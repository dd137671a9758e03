//! Per-tick publications pushed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::ids::{MatchId, PerAgent};
use crate::structs::{Agent, Event, MatchOutcome, Pickup, Projectile, Trap};

/// Full, serializable state of a match at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match this snapshot belongs to.
    pub match_id: MatchId,
    /// Tick counter after the tick completed.
    pub tick: u64,
    /// Time-limit tick.
    pub max_ticks: u64,
    /// Both combatants.
    pub agents: PerAgent<Agent>,
    /// Projectiles in flight.
    pub projectiles: Vec<Projectile>,
    /// Active pickups.
    pub pickups: Vec<Pickup>,
    /// Active traps.
    pub traps: Vec<Trap>,
    /// Set once the match has ended.
    pub outcome: Option<MatchOutcome>,
}

/// What observers receive after every tick: the new state, the previous
/// and current agent positions (for interpolation), and the tick's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickPublication {
    /// State after the tick.
    pub snapshot: MatchSnapshot,
    /// Agent positions before the tick.
    pub previous_positions: PerAgent<Vec2>,
    /// Agent positions after the tick.
    pub positions: PerAgent<Vec2>,
    /// Events produced during the tick, in emission order.
    pub events: Vec<Event>,
    /// Wall-clock time the publication was assembled.
    pub published_at: DateTime<Utc>,
}
