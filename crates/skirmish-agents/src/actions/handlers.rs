//! The seven ability handlers.
//!
//! Each handler is a unit struct registered in the dispatch table. Handlers
//! only run after the gate has passed and the shared bookkeeping (cost,
//! cooldown, usage, contact tick) has been applied.

use skirmish_types::{Ability, AgentId, Event, EventKind};
use skirmish_world::EntityStore;

use super::combat::strike_lands;
use super::{ActionHandler, Rejection};

// ---------------------------------------------------------------------------
// Strikes
// ---------------------------------------------------------------------------

/// Parameters that differ between melee and special strikes.
struct StrikeProfile {
    ability: Ability,
    hit: EventKind,
    miss: EventKind,
    range: f64,
    commit_ticks: u32,
    burn_ticks: u32,
}

/// Swing at the opponent. Commitment applies on hit and miss alike.
fn swing(store: &mut EntityStore, actor: AgentId, profile: &StrikeProfile) {
    let target = actor.opponent();
    let rules = &store.rules().combat;
    let threshold = rules.facing_threshold;
    let damage = rules.abilities.get(profile.ability).damage;

    let me = store.agent_mut(actor);
    me.status.commit_ticks = me.status.commit_ticks.max(profile.commit_ticks);
    me.momentum = 0.0;
    let (from, facing) = (me.position, me.facing);

    let target_pos = store.agent(target).position;
    if !strike_lands(from, facing, target_pos, profile.range, threshold) {
        store.emit(
            Event::new(profile.miss, format!("{actor}'s {} misses", profile.ability))
                .by(actor)
                .on(target)
                .at(from),
        );
        return;
    }

    let dealt = store.strike(actor, target, damage);
    if profile.burn_ticks > 0 {
        let status = &mut store.agent_mut(target).status;
        status.burning_ticks = status.burning_ticks.max(profile.burn_ticks);
    }
    store.emit(
        Event::new(profile.hit, format!("{actor}'s {} hits {target} for {dealt:.0}", profile.ability))
            .by(actor)
            .on(target)
            .amount(dealt)
            .at(target_pos),
    );
}

/// Short-range strike.
#[derive(Debug, Clone, Copy)]
pub struct MeleeHandler;

impl ActionHandler for MeleeHandler {
    fn ability(&self) -> Ability {
        Ability::Melee
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let rules = &store.rules().combat;
        let profile = StrikeProfile {
            ability: Ability::Melee,
            hit: EventKind::MeleeHit,
            miss: EventKind::MeleeMiss,
            range: rules.melee_range,
            commit_ticks: rules.melee_commit_ticks,
            burn_ticks: 0,
        };
        swing(store, actor, &profile);
    }
}

/// Heavy strike that sets the target burning.
#[derive(Debug, Clone, Copy)]
pub struct SpecialHandler;

impl ActionHandler for SpecialHandler {
    fn ability(&self) -> Ability {
        Ability::Special
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let rules = &store.rules().combat;
        let profile = StrikeProfile {
            ability: Ability::Special,
            hit: EventKind::SpecialHit,
            miss: EventKind::SpecialMiss,
            range: rules.special_range,
            commit_ticks: rules.special_commit_ticks,
            burn_ticks: rules.special_burn_ticks,
        };
        swing(store, actor, &profile);
    }
}

// ---------------------------------------------------------------------------
// Ranged
// ---------------------------------------------------------------------------

/// Fires a projectile along the facing direction.
#[derive(Debug, Clone, Copy)]
pub struct RangedHandler;

impl ActionHandler for RangedHandler {
    fn ability(&self) -> Ability {
        Ability::Ranged
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let rules = &store.rules().projectiles;
        let (speed, muzzle) = (rules.speed, rules.muzzle_offset);
        let damage = store.rules().combat.abilities.ranged.damage;
        let me = store.agent(actor);
        let origin = me.position + me.facing * muzzle;
        let velocity = me.facing * speed;
        let id = store.spawn_projectile(actor, origin, velocity, damage);
        store.emit(
            Event::new(EventKind::AbilityUse, format!("{actor} fires projectile {id}"))
                .by(actor)
                .at(origin),
        );
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Raises the guard for this tick.
#[derive(Debug, Clone, Copy)]
pub struct DefendHandler;

impl ActionHandler for DefendHandler {
    fn ability(&self) -> Ability {
        Ability::Defend
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let me = store.agent_mut(actor);
        me.defending = true;
        me.status.shielded = true;
    }
}

/// Instant hop along the facing direction.
#[derive(Debug, Clone, Copy)]
pub struct DashHandler;

impl ActionHandler for DashHandler {
    fn ability(&self) -> Ability {
        Ability::Dash
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let distance = store.rules().combat.dash_distance;
        let me = store.agent_mut(actor);
        let from = me.position;
        me.position += me.facing * distance;
        let to = me.position;
        store.emit(
            Event::new(EventKind::Dash, format!("{actor} dashes"))
                .by(actor)
                .amount(distance)
                .at(from),
        );
        tracing::trace!(agent = %actor, from_x = from.x, to_x = to.x, "dash");
    }
}

/// Restores a fixed amount of health.
#[derive(Debug, Clone, Copy)]
pub struct HealHandler;

impl ActionHandler for HealHandler {
    fn ability(&self) -> Ability {
        Ability::Heal
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let amount = store.rules().combat.heal_amount;
        let restored = store.adjust_hp(actor, amount);
        let position = store.agent(actor).position;
        store.emit(
            Event::new(EventKind::Heal, format!("{actor} heals {restored:.0}"))
                .by(actor)
                .on(actor)
                .amount(restored)
                .at(position),
        );
    }
}

/// Places a trap underfoot, up to the per-owner cap.
#[derive(Debug, Clone, Copy)]
pub struct TrapHandler;

impl ActionHandler for TrapHandler {
    fn ability(&self) -> Ability {
        Ability::Trap
    }

    fn validate(&self, store: &EntityStore, actor: AgentId) -> Result<(), Rejection> {
        let cap = store.rules().traps.max_per_owner;
        if store.active_trap_count(actor) >= cap {
            return Err(Rejection::TrapCapReached { cap });
        }
        Ok(())
    }

    fn apply(&self, store: &mut EntityStore, actor: AgentId) {
        let position = store.agent(actor).position;
        let id = store.place_trap(actor, position);
        store.emit(
            Event::new(EventKind::TrapPlaced, format!("{actor} places trap {id}"))
                .by(actor)
                .at(position),
        );
    }
}
