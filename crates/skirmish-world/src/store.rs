//! The entity store: canonical, mutable match state.
//!
//! [`EntityStore`] is a single-owner aggregate. The tick scheduler is the
//! only writer, and every mutation goes through a method here or through one
//! of the subsystem functions in this crate that take `&mut EntityStore`.
//! Agents are addressed by [`AgentId`] through a [`PerAgent`] pair, never by
//! raw index.
//!
//! Besides the collections, the store owns:
//! - the per-match entity id counter (deterministic ids),
//! - the seeded pickup RNG,
//! - the per-agent visibility cache (current sight plus last-known enemy
//!   position) consulted by [`EntityStore::enemy_view`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_types::{
    Agent, AgentId, ArenaConfig, ArenaView, DecisionRequest, EnemyView, EntityId, Event,
    EventKind, MatchId, MatchOutcome, MatchSnapshot, PerAgent, Pickup, Projectile, Rules,
    SelfView, Trap, Vec2,
};

use crate::error::WorldError;
use crate::terrain::Terrain;
use crate::visibility::{self, SightState};

/// Canonical match state for one two-agent duel.
#[derive(Debug, Clone)]
pub struct EntityStore {
    pub(crate) arena: ArenaConfig,
    pub(crate) terrain: Terrain,
    pub(crate) rules: Rules,
    pub(crate) agents: PerAgent<Agent>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) pickups: Vec<Pickup>,
    pub(crate) traps: Vec<Trap>,
    pub(crate) events: Vec<Event>,
    pub(crate) sight: PerAgent<SightState>,
    pub(crate) rng: StdRng,
    guard_raised: PerAgent<bool>,
    tick: u64,
    max_ticks: u64,
    outcome: Option<MatchOutcome>,
    next_entity: u32,
    seed: u64,
}

impl EntityStore {
    /// Validate the arena and build a freshly initialized store.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the arena is invalid (see [`validate_arena`]).
    pub fn new(arena: ArenaConfig, rules: Rules, max_ticks: u64, seed: u64) -> Result<Self, WorldError> {
        validate_arena(&arena)?;
        let terrain = Terrain::new(arena.height_field.clone())?;
        let agents = spawn_agents(&arena, &rules);
        let mut store = Self {
            arena,
            terrain,
            rules,
            agents,
            projectiles: Vec::new(),
            pickups: Vec::new(),
            traps: Vec::new(),
            events: Vec::new(),
            sight: PerAgent::default(),
            rng: StdRng::seed_from_u64(seed),
            guard_raised: PerAgent::default(),
            tick: 0,
            max_ticks,
            outcome: None,
            next_entity: 0,
            seed,
        };
        store.initialize();
        Ok(store)
    }

    /// Reset every collection and counter and place both agents on their
    /// spawn points, facing each other.
    pub fn initialize(&mut self) {
        self.agents = spawn_agents(&self.arena, &self.rules);
        self.projectiles.clear();
        self.pickups.clear();
        self.traps.clear();
        self.events.clear();
        self.rng = StdRng::seed_from_u64(self.seed);
        self.tick = 0;
        self.outcome = None;
        self.next_entity = 0;
        self.guard_raised = PerAgent::default();
        visibility::prime(self);
        tracing::debug!(seed = self.seed, max_ticks = self.max_ticks, "entity store initialized");
    }

    // -------------------------------------------------------------------
    // Tick bookkeeping
    // -------------------------------------------------------------------

    /// Start a new tick: clear last tick's events, sweep inert entities,
    /// lower both guards, and advance the tick counter. Returns the new tick
    /// number.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MatchFinished`] once an outcome is recorded, or
    /// [`WorldError::ArithmeticOverflow`] if the counter would wrap.
    pub fn begin_tick(&mut self) -> Result<u64, WorldError> {
        if let Some(outcome) = self.outcome {
            return Err(WorldError::MatchFinished { tick: outcome.tick });
        }
        self.events.clear();
        self.sweep();
        self.lower_guards();
        self.tick = self.tick.checked_add(1).ok_or(WorldError::ArithmeticOverflow)?;
        Ok(self.tick)
    }

    /// Clear both agents' defending flags, remembering who had a guard up.
    ///
    /// A guard only lasts for the tick it was requested in, so this runs
    /// before either agent resolves.
    pub fn lower_guards(&mut self) {
        for id in AgentId::ALL {
            let agent = self.agents.get_mut(id);
            *self.guard_raised.get_mut(id) = agent.defending;
            agent.defending = false;
            agent.status.shielded = false;
        }
    }

    /// Whether the agent was defending at the end of the previous tick.
    pub const fn was_defending(&self, id: AgentId) -> bool {
        *self.guard_raised.get(id)
    }

    /// Drop inactive pickups and traps.
    pub fn sweep(&mut self) {
        self.pickups.retain(|p| p.active);
        self.traps.retain(|t| t.active);
    }

    /// Current tick number (0 before the first tick).
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Tick at which the match ends on time.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Recorded outcome, once the match has ended.
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Whether an outcome has been recorded.
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record the match outcome.
    pub const fn finish(&mut self, outcome: MatchOutcome) {
        self.outcome = Some(outcome);
    }

    /// Allocate the next entity id for this match.
    pub const fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        id
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The immutable arena.
    pub const fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    /// Terrain sampler.
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Gameplay rules for this match.
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// One agent.
    pub const fn agent(&self, id: AgentId) -> &Agent {
        self.agents.get(id)
    }

    /// One agent, mutably. Callers are responsible for re-clamping vitals;
    /// prefer the `adjust_*` helpers for hp and energy.
    pub const fn agent_mut(&mut self, id: AgentId) -> &mut Agent {
        self.agents.get_mut(id)
    }

    /// Both agents.
    pub const fn agents(&self) -> &PerAgent<Agent> {
        &self.agents
    }

    /// Projectiles in flight.
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// All pickups (active and awaiting sweep).
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// All traps (active and awaiting sweep).
    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    /// Events emitted so far this tick.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take this tick's events, leaving the list empty.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Append an event to this tick's list.
    pub fn emit(&mut self, event: Event) {
        tracing::trace!(tick = self.tick, kind = ?event.kind, text = %event.text, "event");
        self.events.push(event);
    }

    /// Cached visibility state for an observer.
    pub const fn sight(&self, id: AgentId) -> &SightState {
        self.sight.get(id)
    }

    /// Positions of both agents.
    pub fn positions(&self) -> PerAgent<Vec2> {
        self.agents.map(|_, a| a.position)
    }

    /// Active traps owned by `owner`.
    pub fn active_trap_count(&self, owner: AgentId) -> usize {
        self.traps.iter().filter(|t| t.active && t.owner == owner).count()
    }

    // -------------------------------------------------------------------
    // Vital mutation (always clamped)
    // -------------------------------------------------------------------

    /// Add `delta` to an agent's hp, clamped to `[0, hp_max]`. Returns the
    /// change actually applied.
    pub fn adjust_hp(&mut self, id: AgentId, delta: f64) -> f64 {
        let max = self.rules.vitals.hp_max;
        let agent = self.agents.get_mut(id);
        let before = agent.hp;
        agent.hp = clamp_vital(before + delta, max);
        agent.hp - before
    }

    /// Add `delta` to an agent's energy, clamped to `[0, energy_max]`.
    /// Returns the change actually applied.
    pub fn adjust_energy(&mut self, id: AgentId, delta: f64) -> f64 {
        let max = self.rules.vitals.energy_max;
        let agent = self.agents.get_mut(id);
        let before = agent.energy;
        agent.energy = clamp_vital(before + delta, max);
        agent.energy - before
    }

    /// Apply `amount` of damage to `target` without defend reduction,
    /// recording combat contact and damage totals for both participants.
    /// Returns the damage actually applied after clamping.
    pub fn inflict(&mut self, attacker: Option<AgentId>, target: AgentId, amount: f64) -> f64 {
        let applied = -self.adjust_hp(target, -amount.max(0.0));
        let tick = self.tick;
        let victim = self.agents.get_mut(target);
        victim.damage_taken += applied;
        victim.last_contact_tick = tick;
        if let Some(source) = attacker.filter(|a| *a != target) {
            let dealer = self.agents.get_mut(source);
            dealer.damage_dealt += applied;
            dealer.last_contact_tick = tick;
        }
        applied
    }

    /// Apply a strike of `base` damage, reduced (and rounded) when the target
    /// is defending. Returns the damage actually applied.
    pub fn strike(&mut self, attacker: AgentId, target: AgentId, base: f64) -> f64 {
        let damage = if self.agents.get(target).defending {
            (base * self.rules.combat.defend_reduction).round()
        } else {
            base
        };
        self.inflict(Some(attacker), target, damage)
    }

    // -------------------------------------------------------------------
    // Entity creation
    // -------------------------------------------------------------------

    /// Spawn a projectile and return its id.
    pub fn spawn_projectile(&mut self, owner: AgentId, position: Vec2, velocity: Vec2, damage: f64) -> EntityId {
        let id = self.allocate_id();
        self.projectiles.push(Projectile {
            id,
            owner,
            position,
            velocity,
            damage,
            lifetime: self.rules.projectiles.lifetime,
        });
        id
    }

    /// Place an active trap and return its id. The per-owner cap is the
    /// caller's gate; this method does not enforce it.
    pub fn place_trap(&mut self, owner: AgentId, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        self.traps.push(Trap {
            id,
            owner,
            position,
            active: true,
            age: 0,
        });
        id
    }

    // -------------------------------------------------------------------
    // Read projections
    // -------------------------------------------------------------------

    /// The agent's own full status.
    pub fn self_view(&self, id: AgentId) -> SelfView {
        let a = self.agents.get(id);
        SelfView {
            id,
            hp: a.hp,
            hp_max: self.rules.vitals.hp_max,
            energy: a.energy,
            energy_max: self.rules.vitals.energy_max,
            position: a.position,
            facing: a.facing,
            velocity: a.velocity,
            cooldowns: a.cooldowns,
            status: a.status,
            momentum: a.momentum,
            defending: a.defending,
            active_traps: self.active_trap_count(id),
        }
    }

    /// The opponent as `id` perceives it: live position when visible,
    /// otherwise the cached last-known position with zero velocity.
    pub fn enemy_view(&self, id: AgentId) -> EnemyView {
        let enemy = self.agents.get(id.opponent());
        let sight = self.sight.get(id);
        let (position, velocity) = if sight.can_see {
            (enemy.position, enemy.velocity)
        } else {
            (sight.last_known, Vec2::ZERO)
        };
        EnemyView {
            id: enemy.id,
            hp: enemy.hp,
            hp_max: self.rules.vitals.hp_max,
            energy: enemy.energy,
            position,
            facing: enemy.facing,
            velocity,
            visible: sight.can_see,
            defending: enemy.defending,
            burning: enemy.status.is_burning(),
            slowed: enemy.status.is_slowed(),
        }
    }

    /// Static plus dynamic arena snapshot (active pickups and traps only).
    pub fn arena_view(&self) -> ArenaView {
        ArenaView {
            tick: self.tick,
            max_ticks: self.max_ticks,
            bounds: self.arena.bounds,
            obstacles: self.arena.obstacles.clone(),
            pickups: self.pickups.iter().filter(|p| p.active).cloned().collect(),
            traps: self.traps.iter().filter(|t| t.active).cloned().collect(),
        }
    }

    /// The frozen decision request for one agent at the current tick.
    pub fn decision_request(&self, id: AgentId) -> DecisionRequest {
        DecisionRequest {
            tick: self.tick,
            self_view: self.self_view(id),
            enemies: vec![self.enemy_view(id)],
            arena: self.arena_view(),
        }
    }

    /// Serializable snapshot of the full state.
    pub fn snapshot(&self, match_id: MatchId) -> MatchSnapshot {
        MatchSnapshot {
            match_id,
            tick: self.tick,
            max_ticks: self.max_ticks,
            agents: self.agents.clone(),
            projectiles: self.projectiles.clone(),
            pickups: self.pickups.iter().filter(|p| p.active).cloned().collect(),
            traps: self.traps.iter().filter(|t| t.active).cloned().collect(),
            outcome: self.outcome,
        }
    }

    /// Emit a knockout event for every agent at zero hp. Returns which
    /// agents are down.
    pub fn record_knockouts(&mut self) -> PerAgent<bool> {
        let down = self.agents.map(|_, a| a.is_down());
        for id in AgentId::ALL {
            if *down.get(id) {
                let position = self.agents.get(id).position;
                self.emit(
                    Event::new(EventKind::Knockout, format!("{id} is knocked out"))
                        .by(id.opponent())
                        .on(id)
                        .at(position),
                );
            }
        }
        down
    }
}

/// Check an arena configuration for structural problems.
///
/// # Errors
///
/// Returns [`WorldError`] on degenerate bounds, non-finite obstacles, or
/// spawn points outside the bounds. Height field checks happen in
/// [`Terrain::new`].
pub fn validate_arena(arena: &ArenaConfig) -> Result<(), WorldError> {
    let b = arena.bounds;
    if !b.min.is_finite() || !b.max.is_finite() {
        return Err(WorldError::NonFinite { field: "bounds" });
    }
    if b.max.x <= b.min.x || b.max.y <= b.min.y {
        return Err(WorldError::DegenerateBounds);
    }
    if arena
        .obstacles
        .iter()
        .any(|o| !o.position.is_finite() || !o.radius.is_finite() || o.radius < 0.0)
    {
        return Err(WorldError::NonFinite { field: "obstacles" });
    }
    for id in AgentId::ALL {
        let spawn = *arena.spawn_points.get(id);
        if !spawn.is_finite() || !b.contains(spawn) {
            return Err(WorldError::SpawnOutOfBounds { agent: id });
        }
    }
    Ok(())
}

fn spawn_agents(arena: &ArenaConfig, rules: &Rules) -> PerAgent<Agent> {
    let spawns = arena.spawn_points;
    PerAgent::from_fn(|id| {
        let here = *spawns.get(id);
        let there = *spawns.get(id.opponent());
        let facing = (there - here).normalized().unwrap_or_else(|| match id {
            AgentId::Alpha => Vec2::new(1.0, 0.0),
            AgentId::Bravo => Vec2::new(-1.0, 0.0),
        });
        Agent::spawn(id, here, facing, rules.vitals.hp_max, rules.vitals.energy_max)
    })
}

fn clamp_vital(value: f64, max: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, max.max(0.0)) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skirmish_types::{Bounds, HeightField, Obstacle, ObstacleKind};

    fn store() -> EntityStore {
        EntityStore::new(ArenaConfig::open_field(20.0, 5.0), Rules::default(), 100, 7).unwrap()
    }

    #[test]
    fn new_places_agents_facing_each_other() {
        let s = store();
        assert_eq!(s.agent(AgentId::Alpha).position, Vec2::new(-5.0, 0.0));
        assert_eq!(s.agent(AgentId::Alpha).facing, Vec2::new(1.0, 0.0));
        assert_eq!(s.agent(AgentId::Bravo).facing, Vec2::new(-1.0, 0.0));
        assert_eq!(s.tick(), 0);
        assert!(s.sight(AgentId::Alpha).can_see);
    }

    #[test]
    fn rejects_spawn_outside_bounds() {
        let mut arena = ArenaConfig::open_field(20.0, 5.0);
        arena.spawn_points.bravo = Vec2::new(50.0, 0.0);
        let err = EntityStore::new(arena, Rules::default(), 100, 0);
        assert!(matches!(err, Err(WorldError::SpawnOutOfBounds { agent: AgentId::Bravo })));
    }

    #[test]
    fn rejects_degenerate_bounds() {
        let mut arena = ArenaConfig::open_field(20.0, 5.0);
        arena.bounds = Bounds { min: Vec2::ZERO, max: Vec2::new(0.0, 10.0) };
        assert!(matches!(validate_arena(&arena), Err(WorldError::DegenerateBounds)));
    }

    #[test]
    fn rejects_bad_height_field() {
        let mut arena = ArenaConfig::open_field(20.0, 5.0);
        arena.height_field = HeightField { resolution: 4, size: 40.0, origin: Vec2::ZERO, heights: vec![0.0; 3] };
        assert!(EntityStore::new(arena, Rules::default(), 100, 0).is_err());
    }

    #[test]
    fn begin_tick_clears_events_and_sweeps() {
        let mut s = store();
        s.emit(Event::new(EventKind::Heal, "x"));
        let id = s.place_trap(AgentId::Alpha, Vec2::ZERO);
        s.traps.iter_mut().filter(|t| t.id == id).for_each(|t| t.active = false);
        assert_eq!(s.begin_tick().unwrap(), 1);
        assert!(s.events().is_empty());
        assert!(s.traps().is_empty());
    }

    #[test]
    fn begin_tick_after_finish_errors() {
        let mut s = store();
        s.finish(MatchOutcome { winner: None, reason: skirmish_types::EndReason::TimeLimit, tick: 0 });
        assert!(matches!(s.begin_tick(), Err(WorldError::MatchFinished { tick: 0 })));
    }

    #[test]
    fn vitals_stay_clamped() {
        let mut s = store();
        assert!((s.adjust_hp(AgentId::Alpha, 50.0)).abs() < 1e-9);
        let applied = s.adjust_hp(AgentId::Alpha, -500.0);
        assert!((applied + 100.0).abs() < 1e-9);
        assert!(s.agent(AgentId::Alpha).hp.abs() < 1e-9);
        s.adjust_energy(AgentId::Bravo, f64::NAN);
        assert!(s.agent(AgentId::Bravo).energy.abs() < 1e-9);
    }

    #[test]
    fn strike_against_defender_is_reduced_and_rounded() {
        let mut s = store();
        s.agent_mut(AgentId::Bravo).defending = true;
        let dealt = s.strike(AgentId::Alpha, AgentId::Bravo, 15.0);
        // 15 * 0.5 = 7.5, rounded half away from zero
        assert!((dealt - 8.0).abs() < 1e-9);
        assert!((s.agent(AgentId::Alpha).damage_dealt - 8.0).abs() < 1e-9);
        assert!((s.agent(AgentId::Bravo).damage_taken - 8.0).abs() < 1e-9);
    }

    #[test]
    fn enemy_view_uses_last_known_when_hidden() {
        let mut arena = ArenaConfig::open_field(20.0, 5.0);
        arena.obstacles.push(Obstacle { position: Vec2::ZERO, radius: 1.0, kind: ObstacleKind::Rock });
        let mut s = EntityStore::new(arena, Rules::default(), 100, 0).unwrap();
        // The rock blocks sight from the start; last-known is the spawn point.
        assert!(!s.sight(AgentId::Alpha).can_see);
        s.agent_mut(AgentId::Bravo).position = Vec2::new(5.0, 1.5);
        s.agent_mut(AgentId::Bravo).velocity = Vec2::new(0.0, 0.25);
        let view = s.enemy_view(AgentId::Alpha);
        assert!(!view.visible);
        assert_eq!(view.position, Vec2::new(5.0, 0.0));
        assert_eq!(view.velocity, Vec2::ZERO);
    }

    #[test]
    fn arena_view_lists_only_active_entities() {
        let mut s = store();
        s.place_trap(AgentId::Alpha, Vec2::ZERO);
        let second = s.place_trap(AgentId::Alpha, Vec2::new(1.0, 1.0));
        s.traps.iter_mut().filter(|t| t.id == second).for_each(|t| t.active = false);
        assert_eq!(s.arena_view().traps.len(), 1);
        assert_eq!(s.active_trap_count(AgentId::Alpha), 1);
    }

    #[test]
    fn entity_ids_are_sequential_and_reset() {
        let mut s = store();
        assert_eq!(s.allocate_id(), EntityId(0));
        assert_eq!(s.allocate_id(), EntityId(1));
        s.initialize();
        assert_eq!(s.allocate_id(), EntityId(0));
    }
}
