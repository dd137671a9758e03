//! Ability dispatch: one handler per ability behind a uniform contract.
//!
//! Every ability goes through the same two stages:
//!
//! 1. **Gate.** The shared gate checks the cooldown is zero and the agent can
//!    afford the cost; the handler's own [`ActionHandler::validate`] adds any
//!    ability-specific condition (for example the trap cap). A failed gate
//!    is a silent no-op: no energy spent, no cooldown set, no event.
//! 2. **Apply.** The shared bookkeeping spends energy, sets the cooldown,
//!    counts the use and records combat contact, then
//!    [`ActionHandler::apply`] performs the ability's effect.
//!
//! # Submodules
//!
//! - [`combat`] -- Strike range and facing geometry.
//! - [`handlers`] -- The seven ability handlers.

pub mod combat;
pub mod handlers;

use skirmish_types::{Ability, AgentId};
use skirmish_world::EntityStore;

use handlers::{DashHandler, DefendHandler, HealHandler, MeleeHandler, RangedHandler, SpecialHandler, TrapHandler};

/// Why a requested ability was dropped.
///
/// Not an error: a rejection is a normal policy outcome and leaves no trace
/// in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The ability's cooldown has not elapsed.
    #[error("{ability} on cooldown for {remaining} more ticks")]
    OnCooldown {
        /// Requested ability.
        ability: Ability,
        /// Ticks left on the cooldown.
        remaining: u32,
    },

    /// The agent cannot afford the energy cost.
    #[error("not enough energy for {ability}")]
    InsufficientEnergy {
        /// Requested ability.
        ability: Ability,
    },

    /// The agent already has the maximum number of active traps.
    #[error("trap cap of {cap} reached")]
    TrapCapReached {
        /// Per-owner cap.
        cap: usize,
    },
}

/// Uniform contract implemented by every ability handler.
pub trait ActionHandler: Sync {
    /// The ability this handler implements.
    fn ability(&self) -> Ability;

    /// Ability-specific gate, checked after cooldown and energy.
    fn validate(&self, _store: &EntityStore, _actor: AgentId) -> Result<(), Rejection> {
        Ok(())
    }

    /// Perform the ability's effect. Cost, cooldown, usage count and the
    /// actor's contact tick have already been recorded.
    fn apply(&self, store: &mut EntityStore, actor: AgentId);
}

static MELEE: MeleeHandler = MeleeHandler;
static RANGED: RangedHandler = RangedHandler;
static SPECIAL: SpecialHandler = SpecialHandler;
static DEFEND: DefendHandler = DefendHandler;
static DASH: DashHandler = DashHandler;
static HEAL: HealHandler = HealHandler;
static TRAP: TrapHandler = TrapHandler;

/// The dispatch table: the handler for each ability.
pub fn handler_for(ability: Ability) -> &'static dyn ActionHandler {
    match ability {
        Ability::Melee => &MELEE,
        Ability::Ranged => &RANGED,
        Ability::Special => &SPECIAL,
        Ability::Defend => &DEFEND,
        Ability::Dash => &DASH,
        Ability::Heal => &HEAL,
        Ability::Trap => &TRAP,
    }
}

/// Check the shared cooldown/energy gate and the handler's own gate.
pub fn check_gate(store: &EntityStore, actor: AgentId, handler: &dyn ActionHandler) -> Result<(), Rejection> {
    let ability = handler.ability();
    let agent = store.agent(actor);
    let remaining = *agent.cooldowns.get(ability);
    if remaining > 0 {
        return Err(Rejection::OnCooldown { ability, remaining });
    }
    let cost = store.rules().combat.abilities.get(ability).cost;
    if agent.energy < cost {
        return Err(Rejection::InsufficientEnergy { ability });
    }
    handler.validate(store, actor)
}

/// Gate and perform `ability` for `actor`.
///
/// # Errors
///
/// Returns the [`Rejection`] when the gate fails; the store is untouched.
pub fn perform(store: &mut EntityStore, actor: AgentId, ability: Ability) -> Result<(), Rejection> {
    let handler = handler_for(ability);
    check_gate(store, actor, handler)?;

    let rule = *store.rules().combat.abilities.get(ability);
    let tick = store.tick();
    store.adjust_energy(actor, -rule.cost);
    let agent = store.agent_mut(actor);
    *agent.cooldowns.get_mut(ability) = rule.cooldown;
    agent.ability_uses.bump(ability);
    agent.last_contact_tick = tick;

    handler.apply(store, actor);
    Ok(())
}
