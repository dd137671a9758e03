//! The action resolver: one agent's status tick plus its chosen ability.

use skirmish_types::{Ability, AgentId, Event, EventKind};
use skirmish_world::EntityStore;

use crate::actions::{self, Rejection};
use crate::vitals::apply_status_tick;

/// What happened to the requested action this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// No action was requested.
    Idle,
    /// The ability passed its gate and was performed (hit or miss).
    Performed(Ability),
    /// The ability was silently dropped.
    Dropped(Rejection),
}

/// Resolve one agent's tick: status mechanics, then at most one ability.
///
/// Guards are lowered for both agents by [`EntityStore::begin_tick`], so
/// defending only persists while it is requested (and affordable) every
/// tick. Defend start/end events fire on the transitions against the
/// previous tick.
pub fn resolve_agent(store: &mut EntityStore, actor: AgentId, action: Option<Ability>) -> ActionOutcome {
    apply_status_tick(store, actor);

    let was_defending = store.was_defending(actor);

    let outcome = match action {
        None => ActionOutcome::Idle,
        Some(ability) => match actions::perform(store, actor, ability) {
            Ok(()) => ActionOutcome::Performed(ability),
            Err(rejection) => {
                tracing::debug!(tick = store.tick(), agent = %actor, %rejection, "action dropped");
                ActionOutcome::Dropped(rejection)
            }
        },
    };

    let is_defending = store.agent(actor).defending;
    if is_defending != was_defending {
        let position = store.agent(actor).position;
        let (kind, text) = if is_defending {
            (EventKind::DefendStart, format!("{actor} raises guard"))
        } else {
            (EventKind::DefendEnd, format!("{actor} lowers guard"))
        };
        store.emit(Event::new(kind, text).by(actor).at(position));
    }

    outcome
}
