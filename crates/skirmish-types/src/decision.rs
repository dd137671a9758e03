//! Decision request/response payloads exchanged with agent decision logic.
//!
//! Each tick the scheduler freezes a [`DecisionRequest`] per agent and hands
//! it to that agent's sandbox. The request is a read-only projection:
//! the agent sees its own full status, a redacted view of its opponent
//! (stale position when out of sight), and the static plus dynamic arena.
//! The sandbox answers with a [`Decision`].

use serde::{Deserialize, Serialize};

use crate::arena::Obstacle;
use crate::enums::Ability;
use crate::geometry::{Bounds, Vec2};
use crate::ids::AgentId;
use crate::structs::{PerAbility, Pickup, StatusEffects, Trap};

/// The agent's own full status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfView {
    /// Own identity.
    pub id: AgentId,
    /// Current health.
    pub hp: f64,
    /// Health cap.
    pub hp_max: f64,
    /// Current energy.
    pub energy: f64,
    /// Energy cap.
    pub energy_max: f64,
    /// Live position.
    pub position: Vec2,
    /// Unit facing vector.
    pub facing: Vec2,
    /// Last applied velocity.
    pub velocity: Vec2,
    /// Ticks until each ability is ready.
    pub cooldowns: PerAbility<u32>,
    /// Timed status effects.
    pub status: StatusEffects,
    /// Momentum in `[0, 1]`.
    pub momentum: f64,
    /// Whether the agent defended last tick.
    pub defending: bool,
    /// Own active trap count.
    pub active_traps: usize,
}

/// The opponent as perceived by the requesting agent.
///
/// When `visible` is false, `position` is the last position the requester
/// actually saw and `velocity` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    /// Opponent identity.
    pub id: AgentId,
    /// Current health.
    pub hp: f64,
    /// Health cap.
    pub hp_max: f64,
    /// Current energy.
    pub energy: f64,
    /// Live position when visible, otherwise last-known position.
    pub position: Vec2,
    /// Unit facing vector.
    pub facing: Vec2,
    /// Live velocity when visible, otherwise zero.
    pub velocity: Vec2,
    /// Whether the requester can currently see the opponent.
    pub visible: bool,
    /// Whether the opponent is defending.
    pub defending: bool,
    /// Whether the opponent is burning.
    pub burning: bool,
    /// Whether the opponent is slowed.
    pub slowed: bool,
}

/// Static plus dynamic arena snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaView {
    /// Current tick.
    pub tick: u64,
    /// Tick at which the match ends on time.
    pub max_ticks: u64,
    /// Playable area.
    pub bounds: Bounds,
    /// Obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Active pickups only.
    pub pickups: Vec<Pickup>,
    /// Active traps only.
    pub traps: Vec<Trap>,
}

/// Everything an agent's decision logic receives for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Tick the decision is for.
    pub tick: u64,
    /// The requester's own status.
    pub self_view: SelfView,
    /// Opponent views (one entry in a duel).
    pub enemies: Vec<EnemyView>,
    /// Arena snapshot.
    pub arena: ArenaView,
}

/// One agent's movement/attack decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Decision {
    /// Requested movement direction (clamped to unit length when applied).
    #[serde(rename = "move")]
    pub move_dir: Vec2,
    /// Requested facing direction; zero keeps the movement-derived facing.
    pub aim: Vec2,
    /// Requested ability, or `None` for no action.
    pub action: Option<Ability>,
}

impl Decision {
    /// The neutral decision: stand still, keep facing, no action.
    pub const NEUTRAL: Self = Self {
        move_dir: Vec2::ZERO,
        aim: Vec2::ZERO,
        action: None,
    };

    /// A decision with the given movement, aim, and action.
    pub const fn new(move_dir: Vec2, aim: Vec2, action: Option<Ability>) -> Self {
        Self { move_dir, aim, action }
    }

    /// Whether this is the neutral decision.
    pub fn is_neutral(&self) -> bool {
        self.action.is_none()
            && self.move_dir.length_squared() <= 0.0
            && self.aim.length_squared() <= 0.0
    }
}
