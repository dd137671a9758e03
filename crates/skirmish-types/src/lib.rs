//! Shared type definitions for the Skirmish combat simulation.
//!
//! This crate is the single source of truth for the data that crosses crate
//! boundaries: entity state held by the world store, the request/response
//! payloads exchanged with agent sandboxes, the tunable rule set, and the
//! publications pushed to observers. It holds no behaviour beyond small
//! helpers on the types themselves.
//!
//! # Modules
//!
//! - [`ids`] -- Match, agent, and entity identifiers plus the [`PerAgent`] pair
//! - [`geometry`] -- Planar vectors and arena bounds
//! - [`enums`] -- Abilities, event kinds, pickup and obstacle kinds
//! - [`structs`] -- Agents, projectiles, pickups, traps, events, outcomes
//! - [`arena`] -- Immutable arena configuration (obstacles, height field)
//! - [`rules`] -- Tunable gameplay constants
//! - [`decision`] -- Views handed to decision logic and the decision it returns
//! - [`publication`] -- Snapshots and per-tick publications for observers

pub mod arena;
pub mod decision;
pub mod enums;
pub mod geometry;
pub mod ids;
pub mod publication;
pub mod rules;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use arena::{ArenaConfig, HeightField, Obstacle};
pub use decision::{ArenaView, Decision, DecisionRequest, EnemyView, SelfView};
pub use enums::{Ability, EndReason, EventKind, ObstacleKind, PickupKind};
pub use geometry::{Bounds, EPSILON, Vec2};
pub use ids::{AgentId, EntityId, MatchId, PerAgent};
pub use publication::{MatchSnapshot, TickPublication};
pub use rules::{
    AbilityRule, CombatRules, MovementRules, PickupRules, ProjectileRules, Rules, TrapRules,
    VisibilityRules, VitalRules,
};
pub use structs::{
    Agent, Event, MatchOutcome, PerAbility, Pickup, Projectile, StatusEffects, Trap,
};
