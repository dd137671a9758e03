//! Closed enumerations shared across the workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

/// An ability an agent can invoke as its per-tick action.
///
/// This is both the closed action set accepted from decision logic and the
/// key set for per-ability cooldowns and usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    /// Short-range strike in the facing arc.
    Melee,
    /// Fires a projectile along the facing direction.
    Ranged,
    /// Heavy strike in the facing arc that sets the target burning.
    Special,
    /// Held guard; must be requested every tick to persist.
    Defend,
    /// Instant positional offset along the facing direction.
    Dash,
    /// Restores a fixed amount of health.
    Heal,
    /// Places a trap at the agent's position.
    Trap,
}

impl Ability {
    /// Every ability, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Melee,
        Self::Ranged,
        Self::Special,
        Self::Defend,
        Self::Dash,
        Self::Heal,
        Self::Trap,
    ];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Special => "special",
            Self::Defend => "defend",
            Self::Dash => "dash",
            Self::Heal => "heal",
            Self::Trap => "trap",
        }
    }

    /// Parse a wire name. Anything outside the closed set is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    /// Whether a swing of this ability commits the attacker (movement penalty).
    pub const fn commits(self) -> bool {
        matches!(self, Self::Melee | Self::Special)
    }
}

impl core::fmt::Display for Ability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The tag of a domain event produced during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Melee strike connected.
    MeleeHit,
    /// Melee strike swung but missed (range or facing).
    MeleeMiss,
    /// Projectile struck an agent.
    RangedHit,
    /// Projectile expired without striking anyone.
    RangedMiss,
    /// Special strike connected.
    SpecialHit,
    /// Special strike swung but missed.
    SpecialMiss,
    /// A non-strike ability was used (projectile fired).
    AbilityUse,
    /// Agent raised its guard this tick after not defending last tick.
    DefendStart,
    /// Agent dropped its guard.
    DefendEnd,
    /// Agent collected a pickup.
    PickupCollected,
    /// Burning status dealt damage.
    BurnTick,
    /// Agent reached zero health.
    Knockout,
    /// Agent dashed.
    Dash,
    /// Agent healed.
    Heal,
    /// Agent placed a trap.
    TrapPlaced,
    /// A trap triggered on an agent.
    TrapTriggered,
    /// Agent lost sight of its opponent.
    SightLost,
    /// Agent regained sight of its opponent.
    SightGained,
}

// ---------------------------------------------------------------------------
// Arena objects
// ---------------------------------------------------------------------------

/// What a pickup restores when collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupKind {
    /// Restores health.
    Health,
    /// Restores energy.
    Energy,
}

/// Cosmetic obstacle category supplied by the arena generator.
///
/// Collision treats every kind identically (a circle on the floor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    /// Boulder.
    Rock,
    /// Column or standing stone.
    Pillar,
    /// Tree trunk.
    Tree,
    /// Crystal formation.
    Crystal,
    /// Broken wall segment.
    Ruin,
}

// ---------------------------------------------------------------------------
// Match outcome
// ---------------------------------------------------------------------------

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At least one agent reached zero health.
    Knockout,
    /// The maximum tick count was reached.
    TimeLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_parse_roundtrips_wire_names() {
        for ability in Ability::ALL {
            assert_eq!(Ability::parse(ability.as_str()), Some(ability));
        }
    }

    #[test]
    fn ability_parse_rejects_unknown_and_case_variants() {
        assert_eq!(Ability::parse("fireball"), None);
        assert_eq!(Ability::parse("MELEE"), None);
        assert_eq!(Ability::parse(""), None);
    }

    #[test]
    fn only_strikes_commit() {
        let committing: Vec<_> = Ability::ALL.into_iter().filter(|a| a.commits()).collect();
        assert_eq!(committing, vec![Ability::Melee, Ability::Special]);
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::TrapTriggered).ok();
        assert_eq!(json.as_deref(), Some("\"trap_triggered\""));
    }
}
