//! Visibility subsystem: line-of-sight plus field-of-view per agent.
//!
//! An agent can see its opponent when the segment between them misses every
//! obstacle circle and the opponent lies inside the agent's facing cone.
//! The per-agent cache records the current answer and the last position at
//! which the opponent was actually seen; [`update`] diffs against the cache
//! and emits exactly one sight event per flip.

use serde::{Deserialize, Serialize};
use skirmish_types::{AgentId, Event, EventKind, Obstacle, Vec2};

use crate::collision::segment_hits_circle;
use crate::store::EntityStore;

/// Cached visibility state for one observer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SightState {
    /// Whether the observer saw its opponent on the last update.
    pub can_see: bool,
    /// Opponent position the last time it was visible.
    pub last_known: Vec2,
}

/// Whether the segment from `from` to `to` clears every obstacle.
pub fn has_line_of_sight(from: Vec2, to: Vec2, obstacles: &[Obstacle]) -> bool {
    !obstacles
        .iter()
        .any(|o| segment_hits_circle(from, to, o.position, o.radius))
}

/// Whether `target` lies within the cone around `facing` whose half-angle
/// cosine is `half_fov_cos`. A target at the observer's own position counts
/// as inside.
pub fn in_field_of_view(facing: Vec2, from: Vec2, target: Vec2, half_fov_cos: f64) -> bool {
    let Some(to_target) = (target - from).normalized() else {
        return true;
    };
    let Some(facing) = facing.normalized() else {
        return false;
    };
    facing.dot(to_target) >= half_fov_cos
}

/// Line-of-sight AND field-of-view for `observer` looking at its opponent.
pub fn can_see(store: &EntityStore, observer: AgentId) -> bool {
    let me = store.agent(observer);
    let enemy = store.agent(observer.opponent());
    has_line_of_sight(me.position, enemy.position, &store.arena().obstacles)
        && in_field_of_view(
            me.facing,
            me.position,
            enemy.position,
            store.rules().visibility.half_fov_cos(),
        )
}

/// Seed the cache at match start without emitting events. The last-known
/// position starts at the opponent's spawn point.
pub fn prime(store: &mut EntityStore) {
    for id in AgentId::ALL {
        let seen = can_see(store, id);
        let spawn = store.agent(id.opponent()).position;
        *store.sight.get_mut(id) = SightState {
            can_see: seen,
            last_known: spawn,
        };
    }
}

/// Recompute visibility for both agents, emit sight transition events, and
/// refresh last-known positions for agents that can currently see.
pub fn update(store: &mut EntityStore) {
    for id in AgentId::ALL {
        let seen = can_see(store, id);
        let enemy = store.agent(id.opponent()).position;
        let previous = store.sight.get(id).can_see;

        if previous && !seen {
            store.emit(
                Event::new(EventKind::SightLost, format!("{id} lost sight of {}", id.opponent()))
                    .by(id)
                    .on(id.opponent())
                    .at(enemy),
            );
        } else if !previous && seen {
            store.emit(
                Event::new(EventKind::SightGained, format!("{id} spotted {}", id.opponent()))
                    .by(id)
                    .on(id.opponent())
                    .at(enemy),
            );
        }

        let state = store.sight.get_mut(id);
        state.can_see = seen;
        if seen {
            state.last_known = enemy;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::{ArenaConfig, ObstacleKind, Rules};

    fn rock(x: f64, y: f64, r: f64) -> Obstacle {
        Obstacle {
            position: Vec2::new(x, y),
            radius: r,
            kind: ObstacleKind::Rock,
        }
    }

    #[test]
    fn obstacle_on_segment_blocks_sight() {
        let obstacles = [rock(0.0, 0.0, 1.0)];
        assert!(!has_line_of_sight(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), &obstacles));
        assert!(has_line_of_sight(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0), &obstacles));
    }

    #[test]
    fn obstacle_behind_target_does_not_block() {
        let obstacles = [rock(8.0, 0.0, 1.0)];
        assert!(has_line_of_sight(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), &obstacles));
    }

    #[test]
    fn fov_cone_is_sixty_degrees_either_side() {
        let half_cos = 0.5;
        let facing = Vec2::new(1.0, 0.0);
        let at = |deg: f64| Vec2::new(deg.to_radians().cos(), deg.to_radians().sin()) * 4.0;
        assert!(in_field_of_view(facing, Vec2::ZERO, at(59.0), half_cos));
        assert!(in_field_of_view(facing, Vec2::ZERO, at(-59.0), half_cos));
        assert!(!in_field_of_view(facing, Vec2::ZERO, at(61.0), half_cos));
        assert!(!in_field_of_view(facing, Vec2::ZERO, Vec2::new(-1.0, 0.0), half_cos));
        assert!(in_field_of_view(facing, Vec2::ZERO, Vec2::ZERO, half_cos));
    }

    #[test]
    fn turning_away_emits_one_lost_event_then_nothing() {
        let mut store = EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), 10, 0).unwrap();
        store.agent_mut(AgentId::Alpha).facing = Vec2::new(-1.0, 0.0);
        update(&mut store);
        let lost: Vec<_> = store.events().iter().filter(|e| e.kind == EventKind::SightLost).collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost.first().unwrap().attacker, Some(AgentId::Alpha));

        store.take_events();
        update(&mut store);
        assert!(store.events().is_empty());
    }

    #[test]
    fn last_known_freezes_while_hidden() {
        let mut store = EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), 10, 0).unwrap();
        store.agent_mut(AgentId::Alpha).facing = Vec2::new(-1.0, 0.0);
        update(&mut store);
        store.agent_mut(AgentId::Bravo).position = Vec2::new(6.0, 2.0);
        update(&mut store);
        assert_eq!(store.sight(AgentId::Alpha).last_known, Vec2::new(5.0, 0.0));

        store.agent_mut(AgentId::Alpha).facing = Vec2::new(1.0, 0.0);
        update(&mut store);
        assert!(store.sight(AgentId::Alpha).can_see);
        assert_eq!(store.sight(AgentId::Alpha).last_known, Vec2::new(6.0, 2.0));
        assert!(store.events().iter().any(|e| e.kind == EventKind::SightGained));
    }
}
