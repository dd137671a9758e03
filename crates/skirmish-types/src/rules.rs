//! Tunable gameplay rules.
//!
//! Every numeric constant the simulation uses lives here so that a match
//! configuration file can override it. The [`Default`] impls are the
//! canonical balance values. Each section struct is `#[serde(default)]`, so
//! a YAML file only needs to mention the values it changes (the ability
//! table is the exception: when present it must list all seven abilities).

use serde::{Deserialize, Serialize};

use crate::structs::PerAbility;

/// All gameplay rules for one match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Health/energy caps and per-tick regeneration.
    pub vitals: VitalRules,
    /// Ability costs, cooldowns, and strike geometry.
    pub combat: CombatRules,
    /// Speed, momentum, and terrain response.
    pub movement: MovementRules,
    /// Ranged projectile behaviour.
    pub projectiles: ProjectileRules,
    /// Pickup spawning and collection.
    pub pickups: PickupRules,
    /// Trap placement and triggering.
    pub traps: TrapRules,
    /// Line-of-sight and field-of-view.
    pub visibility: VisibilityRules,
}

/// Health and energy caps plus passive per-tick effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalRules {
    /// Maximum health (default: 100).
    pub hp_max: f64,
    /// Maximum energy (default: 100).
    pub energy_max: f64,
    /// Energy regenerated every tick (default: 0.8).
    pub energy_regen_per_tick: f64,
    /// Health regenerated per tick once out of combat (default: 0.15).
    pub passive_regen_per_tick: f64,
    /// Ticks without combat contact before passive regeneration starts (default: 60).
    pub regen_delay_ticks: u64,
    /// Damage per tick while burning (default: 1.5).
    pub burn_damage_per_tick: f64,
}

impl Default for VitalRules {
    fn default() -> Self {
        Self {
            hp_max: 100.0,
            energy_max: 100.0,
            energy_regen_per_tick: 0.8,
            passive_regen_per_tick: 0.15,
            regen_delay_ticks: 60,
            burn_damage_per_tick: 1.5,
        }
    }
}

/// Cost, cooldown, and base damage for one ability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbilityRule {
    /// Energy spent on use (per tick for defend).
    pub cost: f64,
    /// Ticks before the ability can be used again.
    pub cooldown: u32,
    /// Base damage before defend reduction (strikes and projectiles only).
    #[serde(default)]
    pub damage: f64,
}

/// Ability table and strike geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Cost/cooldown/damage per ability.
    pub abilities: PerAbility<AbilityRule>,
    /// Maximum centre-to-centre distance for a melee hit (default: 2.2).
    pub melee_range: f64,
    /// Maximum centre-to-centre distance for a special hit (default: 3.0).
    pub special_range: f64,
    /// Minimum dot product between facing and direction-to-target (default: 0.5).
    pub facing_threshold: f64,
    /// Damage multiplier against a defending target (default: 0.5).
    pub defend_reduction: f64,
    /// Burning ticks applied by a special hit (default: 30).
    pub special_burn_ticks: u32,
    /// Commit ticks set by a melee swing (default: 4).
    pub melee_commit_ticks: u32,
    /// Commit ticks set by a special swing (default: 7).
    pub special_commit_ticks: u32,
    /// Distance covered by a dash (default: 4.0).
    pub dash_distance: f64,
    /// Health restored by a heal (default: 20).
    pub heal_amount: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            abilities: PerAbility {
                melee: AbilityRule { cost: 8.0, cooldown: 6, damage: 12.0 },
                ranged: AbilityRule { cost: 12.0, cooldown: 10, damage: 8.0 },
                special: AbilityRule { cost: 30.0, cooldown: 45, damage: 22.0 },
                defend: AbilityRule { cost: 1.5, cooldown: 0, damage: 0.0 },
                dash: AbilityRule { cost: 15.0, cooldown: 25, damage: 0.0 },
                heal: AbilityRule { cost: 35.0, cooldown: 80, damage: 0.0 },
                trap: AbilityRule { cost: 20.0, cooldown: 40, damage: 0.0 },
            },
            melee_range: 2.2,
            special_range: 3.0,
            facing_threshold: 0.5,
            defend_reduction: 0.5,
            special_burn_ticks: 30,
            melee_commit_ticks: 4,
            special_commit_ticks: 7,
            dash_distance: 4.0,
            heal_amount: 20.0,
        }
    }
}

/// Movement speed, momentum, and terrain response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    /// Distance per tick at full input on flat ground (default: 0.25).
    pub base_speed: f64,
    /// Collision radius of an agent (default: 0.6).
    pub agent_radius: f64,
    /// Speed multiplier while slowed (default: 0.5).
    pub slow_factor: f64,
    /// Speed multiplier while committed to an attack (default: 0.25).
    pub commit_speed_factor: f64,
    /// Alignment (dot product) above which momentum builds (default: 0.9).
    pub momentum_alignment: f64,
    /// Momentum gained per aligned tick (default: 0.04).
    pub momentum_gain: f64,
    /// Multiplicative momentum decay on a misaligned tick (default: 0.85).
    pub momentum_decay: f64,
    /// Speed bonus at full momentum (default: 0.35, i.e. +35%).
    pub momentum_max_bonus: f64,
    /// Slope (rise over run) above which terrain is effectively blocked (default: 1.0).
    pub max_walkable_slope: f64,
    /// Speed multiplier on unwalkable slopes (default: 0.1).
    pub blocked_speed_factor: f64,
    /// Uphill slowdown per unit of directional slope (default: 0.6).
    pub uphill_penalty: f64,
    /// Downhill speed-up per unit of directional slope (default: 0.2).
    pub downhill_bonus: f64,
    /// Lower bound of the uphill multiplier (default: 0.3).
    pub min_uphill_factor: f64,
}

impl Default for MovementRules {
    fn default() -> Self {
        Self {
            base_speed: 0.25,
            agent_radius: 0.6,
            slow_factor: 0.5,
            commit_speed_factor: 0.25,
            momentum_alignment: 0.9,
            momentum_gain: 0.04,
            momentum_decay: 0.85,
            momentum_max_bonus: 0.35,
            max_walkable_slope: 1.0,
            blocked_speed_factor: 0.1,
            uphill_penalty: 0.6,
            downhill_bonus: 0.2,
            min_uphill_factor: 0.3,
        }
    }
}

/// Ranged projectile behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileRules {
    /// Distance per tick (default: 0.9).
    pub speed: f64,
    /// Ticks before expiry (default: 40).
    pub lifetime: u32,
    /// Centre-to-centre distance that counts as a hit (default: 0.8).
    pub hit_radius: f64,
    /// Spawn distance in front of the shooter (default: 0.8).
    pub muzzle_offset: f64,
}

impl Default for ProjectileRules {
    fn default() -> Self {
        Self {
            speed: 0.9,
            lifetime: 40,
            hit_radius: 0.8,
            muzzle_offset: 0.8,
        }
    }
}

/// Pickup spawning and collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupRules {
    /// Ticks between spawn attempts (default: 120).
    pub spawn_interval: u64,
    /// Maximum simultaneously active pickups (default: 3).
    pub max_active: usize,
    /// Placement attempts per spawn before giving up (default: 12).
    pub placement_attempts: u32,
    /// Extra clearance beyond an obstacle's radius (default: 1.0).
    pub obstacle_clearance: f64,
    /// Distance from the arena edge kept clear (default: 2.0).
    pub edge_margin: f64,
    /// Distance at which an agent collects a pickup (default: 1.2).
    pub collect_radius: f64,
    /// Health restored by a health pickup (default: 25).
    pub health_amount: f64,
    /// Energy restored by an energy pickup (default: 35).
    pub energy_amount: f64,
}

impl Default for PickupRules {
    fn default() -> Self {
        Self {
            spawn_interval: 120,
            max_active: 3,
            placement_attempts: 12,
            obstacle_clearance: 1.0,
            edge_margin: 2.0,
            collect_radius: 1.2,
            health_amount: 25.0,
            energy_amount: 35.0,
        }
    }
}

/// Trap placement and triggering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapRules {
    /// Maximum active traps per owner (default: 2).
    pub max_per_owner: usize,
    /// Distance at which a non-owner triggers a trap (default: 1.2).
    pub trigger_radius: f64,
    /// Damage dealt on trigger (default: 15).
    pub damage: f64,
    /// Slowed ticks applied on trigger (default: 40).
    pub slow_ticks: u32,
    /// Age at which an untriggered trap expires (default: 400).
    pub lifetime: u32,
}

impl Default for TrapRules {
    fn default() -> Self {
        Self {
            max_per_owner: 2,
            trigger_radius: 1.2,
            damage: 15.0,
            slow_ticks: 40,
            lifetime: 400,
        }
    }
}

/// Line-of-sight and field-of-view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityRules {
    /// Full field-of-view angle in degrees (default: 120).
    pub fov_degrees: f64,
}

impl Default for VisibilityRules {
    fn default() -> Self {
        Self { fov_degrees: 120.0 }
    }
}

impl VisibilityRules {
    /// Cosine of half the field of view (the facing-dot threshold).
    pub fn half_fov_cos(&self) -> f64 {
        (self.fov_degrees.to_radians() * 0.5).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Ability;

    #[test]
    fn strikes_cost_energy_and_have_cooldowns() {
        let rules = CombatRules::default();
        for ability in [Ability::Melee, Ability::Ranged, Ability::Special] {
            let rule = rules.abilities.get(ability);
            assert!(rule.cost > 0.0);
            assert!(rule.cooldown > 0);
            assert!(rule.damage > 0.0);
        }
    }

    #[test]
    fn defend_has_no_cooldown() {
        assert_eq!(CombatRules::default().abilities.defend.cooldown, 0);
    }

    #[test]
    fn half_fov_cos_of_120_degrees_is_one_half() {
        let cos = VisibilityRules::default().half_fov_cos();
        assert!((cos - 0.5).abs() < 1e-9);
    }
}
