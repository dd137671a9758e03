//! Projectile flight and hit resolution.

use skirmish_types::{AgentId, Event, EventKind, Projectile};

use crate::collision::overlaps_obstacle;
use crate::store::EntityStore;

/// Why a projectile left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Flying,
    Hit(AgentId),
    Spent,
}

/// Advance every projectile one tick and resolve hits.
///
/// Each projectile moves, ages, and is then checked in this order: leaving
/// the bounds or touching an obstacle removes it; otherwise the first
/// non-owner agent (alpha before bravo) within the hit radius takes
/// defend-reduced damage; otherwise it is removed once its lifetime runs out.
/// Every removal without a hit emits a ranged miss.
pub fn advance(store: &mut EntityStore) {
    let in_flight = std::mem::take(&mut store.projectiles);
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut p in in_flight {
        p.position += p.velocity;
        p.lifetime = p.lifetime.saturating_sub(1);

        match fate(store, &p) {
            Fate::Flying => survivors.push(p),
            Fate::Hit(target) => {
                let dealt = store.strike(p.owner, target, p.damage);
                store.emit(
                    Event::new(
                        EventKind::RangedHit,
                        format!("{}'s shot hits {target} for {dealt:.0}", p.owner),
                    )
                    .by(p.owner)
                    .on(target)
                    .amount(dealt)
                    .at(p.position),
                );
            }
            Fate::Spent => {
                store.emit(
                    Event::new(EventKind::RangedMiss, format!("{}'s shot misses", p.owner))
                        .by(p.owner)
                        .at(p.position),
                );
            }
        }
    }

    // Nothing spawns projectiles during this pass, so order is preserved.
    store.projectiles = survivors;
}

fn fate(store: &EntityStore, p: &Projectile) -> Fate {
    if !store.arena.bounds.contains(p.position) || overlaps_obstacle(p.position, 0.0, &store.arena.obstacles) {
        return Fate::Spent;
    }
    let radius = store.rules.projectiles.hit_radius;
    let hit = AgentId::ALL
        .into_iter()
        .filter(|id| *id != p.owner)
        .find(|id| store.agent(*id).position.distance(p.position) <= radius);
    if let Some(target) = hit {
        return Fate::Hit(target);
    }
    if p.lifetime == 0 { Fate::Spent } else { Fate::Flying }
}
