//! Core entity structs: agents, projectiles, pickups, traps, events.
//!
//! These are plain data. All mutation rules (clamping, cooldown gating,
//! collision) live in `skirmish-world` and `skirmish-agents`.

use serde::{Deserialize, Serialize};

use crate::enums::{Ability, EndReason, EventKind, PickupKind};
use crate::geometry::Vec2;
use crate::ids::{AgentId, EntityId};

// ---------------------------------------------------------------------------
// Per-ability fixed-field bag
// ---------------------------------------------------------------------------

/// One value per [`Ability`], stored as explicit fields.
///
/// Used for cooldown counters and usage counters. Lookups go through
/// [`PerAbility::get`] so the key set is always the closed ability enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerAbility<T> {
    /// Melee value.
    pub melee: T,
    /// Ranged value.
    pub ranged: T,
    /// Special value.
    pub special: T,
    /// Defend value.
    pub defend: T,
    /// Dash value.
    pub dash: T,
    /// Heal value.
    pub heal: T,
    /// Trap value.
    pub trap: T,
}

impl<T> PerAbility<T> {
    /// Shared reference to the value for `ability`.
    pub const fn get(&self, ability: Ability) -> &T {
        match ability {
            Ability::Melee => &self.melee,
            Ability::Ranged => &self.ranged,
            Ability::Special => &self.special,
            Ability::Defend => &self.defend,
            Ability::Dash => &self.dash,
            Ability::Heal => &self.heal,
            Ability::Trap => &self.trap,
        }
    }

    /// Mutable reference to the value for `ability`.
    pub const fn get_mut(&mut self, ability: Ability) -> &mut T {
        match ability {
            Ability::Melee => &mut self.melee,
            Ability::Ranged => &mut self.ranged,
            Ability::Special => &mut self.special,
            Ability::Defend => &mut self.defend,
            Ability::Dash => &mut self.dash,
            Ability::Heal => &mut self.heal,
            Ability::Trap => &mut self.trap,
        }
    }

    /// Iterate `(ability, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Ability, &T)> {
        Ability::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

impl PerAbility<u32> {
    /// Decrement every non-zero counter by one.
    pub fn tick_down(&mut self) {
        for ability in Ability::ALL {
            let slot = self.get_mut(ability);
            *slot = slot.saturating_sub(1);
        }
    }

    /// Add one to the counter for `ability`.
    pub fn bump(&mut self, ability: Ability) {
        let slot = self.get_mut(ability);
        *slot = slot.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Timed status effects carried by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Ticks of burn damage remaining.
    pub burning_ticks: u32,
    /// Ticks of halved movement speed remaining.
    pub slowed_ticks: u32,
    /// Damage reduction active this tick (mirrors `defending`).
    pub shielded: bool,
    /// Ticks of post-swing movement penalty remaining.
    pub commit_ticks: u32,
}

impl StatusEffects {
    /// Whether the agent is burning.
    pub const fn is_burning(&self) -> bool {
        self.burning_ticks > 0
    }

    /// Whether the agent is slowed.
    pub const fn is_slowed(&self) -> bool {
        self.slowed_ticks > 0
    }

    /// Whether the agent is committed to an attack.
    pub const fn is_committed(&self) -> bool {
        self.commit_ticks > 0
    }
}

/// One combatant's full mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Which side this agent is.
    pub id: AgentId,
    /// Health, clamped to `[0, hp_max]`.
    pub hp: f64,
    /// Energy, clamped to `[0, energy_max]`.
    pub energy: f64,
    /// Position on the arena floor.
    pub position: Vec2,
    /// Unit facing vector.
    pub facing: Vec2,
    /// Velocity applied on the last movement step.
    pub velocity: Vec2,
    /// Ticks until each ability is ready again.
    pub cooldowns: PerAbility<u32>,
    /// Timed status effects.
    pub status: StatusEffects,
    /// Sustained-movement bonus in `[0, 1]`.
    pub momentum: f64,
    /// Tick of the last combat contact (hit dealt, hit taken, or burn).
    pub last_contact_tick: u64,
    /// Whether the agent is defending this tick.
    pub defending: bool,
    /// Total damage this agent has dealt.
    pub damage_dealt: f64,
    /// Total damage this agent has taken.
    pub damage_taken: f64,
    /// Successful uses per ability.
    pub ability_uses: PerAbility<u32>,
}

impl Agent {
    /// A fresh agent at full health and energy.
    pub fn spawn(id: AgentId, position: Vec2, facing: Vec2, hp_max: f64, energy_max: f64) -> Self {
        Self {
            id,
            hp: hp_max,
            energy: energy_max,
            position,
            facing: facing.normalized().unwrap_or(Vec2::new(1.0, 0.0)),
            velocity: Vec2::ZERO,
            cooldowns: PerAbility::default(),
            status: StatusEffects::default(),
            momentum: 0.0,
            last_contact_tick: 0,
            defending: false,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            ability_uses: PerAbility::default(),
        }
    }

    /// Whether the agent has been knocked out.
    pub fn is_down(&self) -> bool {
        self.hp <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Projectile / Pickup / Trap
// ---------------------------------------------------------------------------

/// A ranged-attack projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Store-allocated identifier.
    pub id: EntityId,
    /// Agent that fired it (never hit by its own projectile).
    pub owner: AgentId,
    /// Current position.
    pub position: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Damage on hit before defend reduction.
    pub damage: f64,
    /// Ticks until the projectile expires.
    pub lifetime: u32,
}

/// A collectible health or energy pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Store-allocated identifier.
    pub id: EntityId,
    /// Position on the floor.
    pub position: Vec2,
    /// What it restores.
    pub kind: PickupKind,
    /// Inactive pickups are inert and removed on the next sweep.
    pub active: bool,
}

/// A placed trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trap {
    /// Store-allocated identifier.
    pub id: EntityId,
    /// Agent that placed it (immune to its own trap).
    pub owner: AgentId,
    /// Position on the floor.
    pub position: Vec2,
    /// Inactive traps are inert and removed on the next sweep.
    pub active: bool,
    /// Ticks since placement.
    pub age: u32,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A domain event produced during one tick.
///
/// Events are transient: the store clears them at the start of every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event tag.
    pub kind: EventKind,
    /// Acting agent, if any.
    pub attacker: Option<AgentId>,
    /// Affected agent, if any.
    pub target: Option<AgentId>,
    /// Damage or amount involved, if any.
    pub damage: Option<f64>,
    /// Where it happened, if meaningful.
    pub position: Option<Vec2>,
    /// Human-readable description.
    pub text: String,
}

impl Event {
    /// An event with only a tag and text.
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            attacker: None,
            target: None,
            damage: None,
            position: None,
            text: text.into(),
        }
    }

    /// Set the acting agent.
    #[must_use]
    pub const fn by(mut self, attacker: AgentId) -> Self {
        self.attacker = Some(attacker);
        self
    }

    /// Set the affected agent.
    #[must_use]
    pub const fn on(mut self, target: AgentId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the damage or amount.
    #[must_use]
    pub const fn amount(mut self, damage: f64) -> Self {
        self.damage = Some(damage);
        self
    }

    /// Set the position.
    #[must_use]
    pub const fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// The winner, or `None` for a draw.
    pub winner: Option<AgentId>,
    /// Why the match ended.
    pub reason: EndReason,
    /// Tick on which the match ended.
    pub tick: u64,
}
