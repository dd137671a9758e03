//! Collision resolution between agents, obstacles, and arena bounds.
//!
//! Order per tick is fixed: push each agent out of obstacles, clamp each
//! agent into bounds, then separate the two agents symmetrically. Obstacles
//! are treated as flat circles on the floor.

use skirmish_types::{AgentId, Obstacle, Vec2};

use crate::store::EntityStore;

/// Fallback separation axis when two centres coincide.
const TIE_AXIS: Vec2 = Vec2::new(1.0, 0.0);

/// Whether the segment `a`..`b` passes within `radius` of `center`.
pub fn segment_hits_circle(a: Vec2, b: Vec2, center: Vec2, radius: f64) -> bool {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 {
        ((center - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = a + ab * t;
    closest.distance(center) < radius
}

/// Whether a circle at `p` with `radius` overlaps any obstacle.
pub fn overlaps_obstacle(p: Vec2, radius: f64, obstacles: &[Obstacle]) -> bool {
    obstacles
        .iter()
        .any(|o| p.distance(o.position) < o.radius + radius)
}

/// Move `p` out of every obstacle it overlaps, in obstacle order.
pub fn push_out_of_obstacles(mut p: Vec2, radius: f64, obstacles: &[Obstacle]) -> Vec2 {
    for o in obstacles {
        let min_dist = o.radius + radius;
        let offset = p - o.position;
        if offset.length() < min_dist {
            let axis = offset.normalized().unwrap_or(TIE_AXIS);
            p = o.position + axis * min_dist;
        }
    }
    p
}

/// Push two overlapping circles apart, half the overlap each, along the
/// axis between their centres.
pub fn separate(a: Vec2, b: Vec2, radius: f64) -> (Vec2, Vec2) {
    let min_dist = radius * 2.0;
    let offset = b - a;
    let dist = offset.length();
    if dist >= min_dist {
        return (a, b);
    }
    let axis = offset.normalized().unwrap_or(TIE_AXIS);
    let half = (min_dist - dist) * 0.5;
    (a - axis * half, b + axis * half)
}

/// Resolve obstacle, bounds, and agent–agent collisions for both agents.
pub fn resolve(store: &mut EntityStore) {
    let radius = store.rules.movement.agent_radius;
    let bounds = store.arena.bounds;

    for id in AgentId::ALL {
        let agent = store.agents.get_mut(id);
        let pushed = push_out_of_obstacles(agent.position, radius, &store.arena.obstacles);
        agent.position = bounds.clamp(pushed, radius);
    }

    let (a, b) = separate(store.agents.alpha.position, store.agents.bravo.position, radius);
    store.agents.alpha.position = bounds.clamp(a, radius);
    store.agents.bravo.position = bounds.clamp(b, radius);
}
