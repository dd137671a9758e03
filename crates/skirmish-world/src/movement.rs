//! Movement: requested direction to velocity and position.
//!
//! Speed is built up multiplicatively from the base speed:
//!
//! 1. input magnitude (the request is clamped to unit length),
//! 2. slow status,
//! 3. terrain (blocked above the walkable slope, otherwise uphill penalty or
//!    downhill bonus along the direction of travel),
//! 4. either the momentum bonus, or, while committed to an attack, the
//!    commit penalty (which also zeroes momentum).
//!
//! Facing follows the aim vector when one is given, otherwise the movement
//! direction, otherwise it is left unchanged.

use skirmish_types::{Agent, AgentId, Decision, MovementRules, Vec2};

use crate::store::EntityStore;
use crate::terrain::Terrain;

/// Terrain speed multiplier for moving along unit `direction` from `p`.
pub fn terrain_factor(terrain: &Terrain, p: Vec2, direction: Vec2, rules: &MovementRules) -> f64 {
    if terrain.slope_at(p) > rules.max_walkable_slope {
        return rules.blocked_speed_factor;
    }
    let along = terrain.directional_slope(p, direction);
    if along > 0.0 {
        (1.0 - along * rules.uphill_penalty).max(rules.min_uphill_factor)
    } else {
        (-along).mul_add(rules.downhill_bonus, 1.0)
    }
}

/// Next momentum value given the previous velocity and requested direction.
pub fn next_momentum(momentum: f64, previous_velocity: Vec2, direction: Vec2, rules: &MovementRules) -> f64 {
    let aligned = match (previous_velocity.normalized(), direction.normalized()) {
        (Some(prev), Some(dir)) => prev.dot(dir) > rules.momentum_alignment,
        _ => false,
    };
    if aligned {
        (momentum + rules.momentum_gain).min(1.0)
    } else {
        (momentum * rules.momentum_decay).clamp(0.0, 1.0)
    }
}

/// Apply one movement step to `agent` in place.
pub fn step(agent: &mut Agent, decision: &Decision, terrain: &Terrain, rules: &MovementRules) {
    let request = decision.move_dir.finite_or_zero().clamp_length(1.0);
    let aim = decision.aim.finite_or_zero();

    if let Some(facing) = aim.normalized().or_else(|| request.normalized()) {
        agent.facing = facing;
    }

    let momentum = next_momentum(agent.momentum, agent.velocity, request, rules);
    let Some(direction) = request.normalized() else {
        agent.momentum = if agent.status.is_committed() { 0.0 } else { momentum };
        agent.velocity = Vec2::ZERO;
        return;
    };

    let mut speed = rules.base_speed * request.length();
    if agent.status.is_slowed() {
        speed *= rules.slow_factor;
    }
    speed *= terrain_factor(terrain, agent.position, direction, rules);

    if agent.status.is_committed() {
        speed *= rules.commit_speed_factor;
        agent.momentum = 0.0;
    } else {
        agent.momentum = momentum;
        speed *= momentum.mul_add(rules.momentum_max_bonus, 1.0);
    }

    agent.velocity = direction * speed;
    agent.position += agent.velocity;
}

/// Apply one agent's movement/facing for this tick.
pub fn apply(store: &mut EntityStore, id: AgentId, decision: &Decision) {
    let agent = store.agents.get_mut(id);
    step(agent, decision, &store.terrain, &store.rules.movement);
}
