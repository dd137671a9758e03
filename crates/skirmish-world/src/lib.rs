//! Entity store and physical simulation for the Skirmish combat engine.
//!
//! This crate owns the canonical match state and every physical rule that
//! acts on it between decisions: movement over terrain, collision with
//! obstacles, bounds and the other agent, projectile flight, pickups,
//! traps, and visibility.
//!
//! # Modules
//!
//! - [`store`] -- [`EntityStore`], the single-owner mutable match state, and
//!   its per-agent read projections.
//! - [`terrain`] -- Height field sampling (height, gradient, slope).
//! - [`movement`] -- Requested direction to velocity, with momentum, slow,
//!   commit, and terrain modifiers.
//! - [`collision`] -- Obstacle push-out, bounds clamping, agent separation,
//!   and segment/circle tests.
//! - [`projectiles`] -- Projectile flight, hits, and expiry.
//! - [`pickups`] -- Seeded pickup spawning and collection.
//! - [`traps`] -- Trap triggering and expiry.
//! - [`visibility`] -- Line-of-sight, field-of-view, and the sight cache.
//! - [`error`] -- Error types for arena validation and tick bookkeeping.

pub mod collision;
pub mod error;
pub mod movement;
pub mod pickups;
pub mod projectiles;
pub mod store;
pub mod terrain;
pub mod traps;
pub mod visibility;

pub use error::WorldError;
pub use store::{EntityStore, validate_arena};
pub use terrain::Terrain;
pub use visibility::SightState;
