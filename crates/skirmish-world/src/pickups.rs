//! Pickup spawning and collection.
//!
//! Spawning is driven by the store's seeded RNG, so two runs with the same
//! seed place the same pickups at the same ticks. A spawn attempt that
//! cannot find a clear spot within the configured number of tries is
//! skipped.

use rand::Rng;
use skirmish_types::{AgentId, Event, EventKind, Pickup, PickupKind, Vec2};

use crate::store::EntityStore;

/// Attempt a pickup spawn if this tick is on the spawn interval and the
/// active cap leaves room. Returns the spawned pickup's position, if any.
pub fn try_spawn(store: &mut EntityStore) -> Option<Vec2> {
    let rules = store.rules.pickups.clone();
    let tick = store.tick();
    if rules.spawn_interval == 0 || tick == 0 || tick.checked_rem(rules.spawn_interval) != Some(0) {
        return None;
    }
    let active = store.pickups.iter().filter(|p| p.active).count();
    if active >= rules.max_active {
        return None;
    }

    let b = store.arena.bounds;
    let (lo_x, hi_x) = (b.min.x + rules.edge_margin, b.max.x - rules.edge_margin);
    let (lo_y, hi_y) = (b.min.y + rules.edge_margin, b.max.y - rules.edge_margin);
    if lo_x >= hi_x || lo_y >= hi_y {
        tracing::debug!(tick, "arena too small for pickup margin; spawn skipped");
        return None;
    }

    for _ in 0..rules.placement_attempts {
        let candidate = Vec2::new(
            store.rng.random_range(lo_x..hi_x),
            store.rng.random_range(lo_y..hi_y),
        );
        let blocked = store
            .arena
            .obstacles
            .iter()
            .any(|o| candidate.distance(o.position) < o.radius + rules.obstacle_clearance);
        if blocked {
            continue;
        }
        let kind = if store.rng.random_bool(0.5) {
            PickupKind::Health
        } else {
            PickupKind::Energy
        };
        let id = store.allocate_id();
        store.pickups.push(Pickup {
            id,
            position: candidate,
            kind,
            active: true,
        });
        tracing::debug!(tick, %id, ?kind, x = candidate.x, y = candidate.y, "pickup spawned");
        return Some(candidate);
    }

    tracing::debug!(tick, attempts = rules.placement_attempts, "no clear pickup spot; spawn skipped");
    None
}

/// Collect every active pickup touched by an agent. A pickup goes to the
/// first agent within range in resolution order and is deactivated.
pub fn collect(store: &mut EntityStore) {
    let radius = store.rules.pickups.collect_radius;
    let health = store.rules.pickups.health_amount;
    let energy = store.rules.pickups.energy_amount;

    let mut collected = Vec::new();
    for pickup in store.pickups.iter_mut().filter(|p| p.active) {
        let taker = AgentId::ALL
            .into_iter()
            .find(|id| store.agents.get(*id).position.distance(pickup.position) <= radius);
        if let Some(id) = taker {
            pickup.active = false;
            collected.push((id, pickup.kind, pickup.position));
        }
    }

    for (id, kind, position) in collected {
        let restored = match kind {
            PickupKind::Health => store.adjust_hp(id, health),
            PickupKind::Energy => store.adjust_energy(id, energy),
        };
        store.emit(
            Event::new(
                EventKind::PickupCollected,
                format!("{id} collects a {} pickup", kind_name(kind)),
            )
            .by(id)
            .amount(restored)
            .at(position),
        );
    }
}

const fn kind_name(kind: PickupKind) -> &'static str {
    match kind {
        PickupKind::Health => "health",
        PickupKind::Energy => "energy",
    }
}
