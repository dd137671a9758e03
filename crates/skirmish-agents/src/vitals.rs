//! Status mechanics applied to each agent once per tick, before its action.
//!
//! # Order of operations
//!
//! 1. Decrement every non-zero cooldown
//! 2. Decrement attack commitment
//! 3. Regenerate energy up to the cap
//! 4. If burning: burn damage, decrement burn, burn event, combat contact
//! 5. Otherwise, once out of combat long enough: passive health regeneration
//! 6. Decrement slow
//!
//! All counters use saturating arithmetic; vitals are clamped by the store.

use skirmish_types::{AgentId, Event, EventKind};
use skirmish_world::EntityStore;

/// Apply one tick of status mechanics to `id`.
pub fn apply_status_tick(store: &mut EntityStore, id: AgentId) {
    let vitals = store.rules().vitals.clone();
    let tick = store.tick();

    {
        let agent = store.agent_mut(id);
        agent.cooldowns.tick_down();
        agent.status.commit_ticks = agent.status.commit_ticks.saturating_sub(1);
    }

    store.adjust_energy(id, vitals.energy_regen_per_tick);

    if store.agent(id).status.is_burning() {
        let dealt = store.inflict(None, id, vitals.burn_damage_per_tick);
        let agent = store.agent_mut(id);
        agent.status.burning_ticks = agent.status.burning_ticks.saturating_sub(1);
        let position = agent.position;
        store.emit(
            Event::new(EventKind::BurnTick, format!("{id} burns for {dealt:.1}"))
                .on(id)
                .amount(dealt)
                .at(position),
        );
    } else {
        let since_contact = tick.saturating_sub(store.agent(id).last_contact_tick);
        if since_contact > vitals.regen_delay_ticks {
            store.adjust_hp(id, vitals.passive_regen_per_tick);
        }
    }

    let agent = store.agent_mut(id);
    agent.status.slowed_ticks = agent.status.slowed_ticks.saturating_sub(1);
}
