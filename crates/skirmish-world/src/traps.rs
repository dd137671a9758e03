//! Trap triggering and expiry.

use skirmish_types::{AgentId, Event, EventKind};

use crate::store::EntityStore;

/// Trigger and age every active trap.
///
/// A trap fires on the first non-owner agent (in resolution order) inside
/// its trigger radius: the trap deactivates, the victim takes the fixed trap
/// damage (not defend-reduced) and is slowed. Traps that do not fire age by
/// one tick and deactivate once they reach their lifetime.
pub fn resolve(store: &mut EntityStore) {
    let rules = store.rules.traps.clone();

    let mut triggered = Vec::new();
    for trap in store.traps.iter_mut().filter(|t| t.active) {
        let victim = AgentId::ALL
            .into_iter()
            .filter(|id| *id != trap.owner)
            .find(|id| store.agents.get(*id).position.distance(trap.position) <= rules.trigger_radius);
        if let Some(victim) = victim {
            trap.active = false;
            triggered.push((trap.owner, victim, trap.position));
            continue;
        }
        trap.age = trap.age.saturating_add(1);
        if trap.age >= rules.lifetime {
            trap.active = false;
            tracing::debug!(id = %trap.id, owner = %trap.owner, "trap expired");
        }
    }

    for (owner, victim, position) in triggered {
        let dealt = store.inflict(Some(owner), victim, rules.damage);
        let status = &mut store.agent_mut(victim).status;
        status.slowed_ticks = status.slowed_ticks.max(rules.slow_ticks);
        store.emit(
            Event::new(
                EventKind::TrapTriggered,
                format!("{victim} steps on {owner}'s trap for {dealt:.0}"),
            )
            .by(owner)
            .on(victim)
            .amount(dealt)
            .at(position),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::{ArenaConfig, Rules, Vec2};

    fn store() -> EntityStore {
        EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), 1000, 0).unwrap()
    }

    #[test]
    fn owner_is_immune() {
        let mut s = store();
        s.place_trap(AgentId::Alpha, Vec2::new(-5.0, 0.0));
        resolve(&mut s);
        assert_eq!(s.active_trap_count(AgentId::Alpha), 1);
        assert!(s.events().is_empty());
    }

    #[test]
    fn enemy_triggers_damage_and_slow() {
        let mut s = store();
        let rules = Rules::default().traps;
        s.place_trap(AgentId::Alpha, Vec2::new(5.0, 0.5));
        resolve(&mut s);
        let bravo = s.agent(AgentId::Bravo);
        assert!((bravo.hp - (100.0 - rules.damage)).abs() < 1e-9);
        assert_eq!(bravo.status.slowed_ticks, rules.slow_ticks);
        assert_eq!(s.active_trap_count(AgentId::Alpha), 0);
        assert_eq!(s.events().len(), 1);
    }

    #[test]
    fn defending_does_not_reduce_trap_damage() {
        let mut s = store();
        s.agent_mut(AgentId::Bravo).defending = true;
        s.place_trap(AgentId::Alpha, Vec2::new(5.0, 0.0));
        resolve(&mut s);
        assert!((s.agent(AgentId::Bravo).hp - 85.0).abs() < 1e-9);
    }

    #[test]
    fn untriggered_trap_expires_at_lifetime() {
        let mut s = store();
        s.place_trap(AgentId::Bravo, Vec2::new(0.0, 10.0));
        for _ in 1..Rules::default().traps.lifetime {
            resolve(&mut s);
        }
        assert_eq!(s.active_trap_count(AgentId::Bravo), 1);
        resolve(&mut s);
        assert_eq!(s.active_trap_count(AgentId::Bravo), 0);
    }
}
