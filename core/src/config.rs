//! Tunable battle configuration.
//!
//! Numeric stats are configuration rather than design: every field carries a
//! default and deserialization fills missing fields from those defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BattleGrid, PawnWeapon, UnitKind};

/// Complete configuration of a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Width of a cell in world units.
    pub cell_width: f32,
    /// Height of a cell in world units.
    pub cell_height: f32,
    /// Base stats per unit kind.
    pub units: UnitStatTable,
    /// Healer parameters.
    pub heal: HealConfig,
    /// Pawn weapon profiles.
    pub weapons: WeaponTable,
    /// Projectile ballistics parameters.
    pub projectile: ProjectileConfig,
    /// Charge gold for placements made before the battle starts.
    pub charge_setup_placement: bool,
    /// Seed for cosmetic randomness such as swing animation variants.
    pub seed: u64,
}

impl BattleConfig {
    /// Grid geometry described by this configuration.
    #[must_use]
    pub fn grid(&self) -> BattleGrid {
        BattleGrid::new(self.columns, self.rows, self.cell_width, self.cell_height)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 8,
            cell_width: 60.0,
            cell_height: 72.0,
            units: UnitStatTable::default(),
            heal: HealConfig::default(),
            weapons: WeaponTable::default(),
            projectile: ProjectileConfig::default(),
            charge_setup_placement: false,
            seed: 0x5eed_0f_ba77_1e,
        }
    }
}

/// Base stats assigned to a unit kind at placement time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub max_hp: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Attack range in cells.
    pub attack_range_cells: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Flat damage reduction.
    pub armor: u32,
    /// Attack wind-up in milliseconds.
    pub attack_duration_ms: u64,
    /// Recovery pad added after an attack, in milliseconds.
    pub recovery_ms: u64,
    /// Gold cost of placing the unit.
    pub cost: u32,
    /// Gold awarded to the opposing side when the unit dies.
    pub bounty: u32,
}

impl UnitStats {
    /// Attack wind-up as a duration.
    #[must_use]
    pub const fn attack_duration(&self) -> Duration {
        Duration::from_millis(self.attack_duration_ms)
    }

    /// Recovery pad as a duration.
    #[must_use]
    pub const fn recovery(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }
}

/// Stats for every unit kind.
///
/// Deserialization starts from each kind's defaults, so an override lists
/// only the fields it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "UnitStatOverrides")]
pub struct UnitStatTable {
    /// Archer stats.
    pub archer: UnitStats,
    /// Warrior stats.
    pub warrior: UnitStats,
    /// Lancer stats.
    pub lancer: UnitStats,
    /// Monk stats.
    pub monk: UnitStats,
    /// Pawn stats.
    pub pawn: UnitStats,
}

impl UnitStatTable {
    /// Looks up the stats of a unit kind.
    #[must_use]
    pub const fn get(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Archer => &self.archer,
            UnitKind::Warrior => &self.warrior,
            UnitKind::Lancer => &self.lancer,
            UnitKind::Monk => &self.monk,
            UnitKind::Pawn => &self.pawn,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct UnitStatOverrides {
    archer: UnitStatsPatch,
    warrior: UnitStatsPatch,
    lancer: UnitStatsPatch,
    monk: UnitStatsPatch,
    pawn: UnitStatsPatch,
}

#[derive(Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct UnitStatsPatch {
    max_hp: Option<u32>,
    damage: Option<u32>,
    attack_range_cells: Option<f32>,
    speed: Option<f32>,
    armor: Option<u32>,
    attack_duration_ms: Option<u64>,
    recovery_ms: Option<u64>,
    cost: Option<u32>,
    bounty: Option<u32>,
}

impl UnitStatsPatch {
    fn apply(self, base: UnitStats) -> UnitStats {
        UnitStats {
            max_hp: self.max_hp.unwrap_or(base.max_hp),
            damage: self.damage.unwrap_or(base.damage),
            attack_range_cells: self.attack_range_cells.unwrap_or(base.attack_range_cells),
            speed: self.speed.unwrap_or(base.speed),
            armor: self.armor.unwrap_or(base.armor),
            attack_duration_ms: self.attack_duration_ms.unwrap_or(base.attack_duration_ms),
            recovery_ms: self.recovery_ms.unwrap_or(base.recovery_ms),
            cost: self.cost.unwrap_or(base.cost),
            bounty: self.bounty.unwrap_or(base.bounty),
        }
    }
}

impl From<UnitStatOverrides> for UnitStatTable {
    fn from(overrides: UnitStatOverrides) -> Self {
        let base = Self::default();
        Self {
            archer: overrides.archer.apply(base.archer),
            warrior: overrides.warrior.apply(base.warrior),
            lancer: overrides.lancer.apply(base.lancer),
            monk: overrides.monk.apply(base.monk),
            pawn: overrides.pawn.apply(base.pawn),
        }
    }
}

impl Default for UnitStatTable {
    fn default() -> Self {
        Self {
            archer: UnitStats {
                max_hp: 100,
                damage: 15,
                attack_range_cells: 5.0,
                speed: 48.0,
                armor: 0,
                attack_duration_ms: 700,
                recovery_ms: 300,
                cost: 50,
                bounty: 25,
            },
            warrior: UnitStats {
                max_hp: 200,
                damage: 22,
                attack_range_cells: 1.0,
                speed: 72.0,
                armor: 8,
                attack_duration_ms: 500,
                recovery_ms: 200,
                cost: 80,
                bounty: 40,
            },
            lancer: UnitStats {
                max_hp: 160,
                damage: 18,
                attack_range_cells: 2.0,
                speed: 60.0,
                armor: 5,
                attack_duration_ms: 700,
                recovery_ms: 400,
                cost: 100,
                bounty: 50,
            },
            monk: UnitStats {
                max_hp: 90,
                damage: 0,
                attack_range_cells: 1.0,
                speed: 42.0,
                armor: 0,
                attack_duration_ms: 500,
                recovery_ms: 800,
                cost: 70,
                bounty: 35,
            },
            pawn: UnitStats {
                max_hp: 120,
                damage: 0,
                attack_range_cells: 1.0,
                speed: 66.0,
                armor: 3,
                attack_duration_ms: 500,
                recovery_ms: 0,
                cost: 40,
                bounty: 20,
            },
        }
    }
}

/// Parameters of the healer's cast.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    /// Hit points restored per cast.
    pub amount: u32,
    /// Radius, in cells, within which allies can be healed.
    pub radius_cells: f32,
    /// Delay between starting a cast and applying the heal, in milliseconds.
    pub cast_delay_ms: u64,
}

impl HealConfig {
    /// Cast delay as a duration.
    #[must_use]
    pub const fn cast_delay(&self) -> Duration {
        Duration::from_millis(self.cast_delay_ms)
    }
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            amount: 25,
            radius_cells: 3.0,
            cast_delay_ms: 600,
        }
    }
}

/// Damage profile of a pawn weapon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Damage per swing before armor.
    pub damage: u32,
    /// Extra recovery after a swing, in milliseconds.
    pub cooldown_ms: u64,
    /// Fraction of the target's armor ignored, in `[0, 1]`.
    pub armor_pierce: f32,
}

impl WeaponProfile {
    /// Extra recovery as a duration.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Profiles for every pawn weapon plus switching rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTable {
    /// Axe profile.
    pub axe: WeaponProfile,
    /// Knife profile.
    pub knife: WeaponProfile,
    /// Hammer profile.
    pub hammer: WeaponProfile,
    /// Pickaxe profile.
    pub pickaxe: WeaponProfile,
    /// Minimum time between two weapon switches, in milliseconds.
    pub switch_cooldown_ms: u64,
}

impl WeaponTable {
    /// Looks up the profile of a weapon.
    #[must_use]
    pub const fn profile(&self, weapon: PawnWeapon) -> &WeaponProfile {
        match weapon {
            PawnWeapon::Axe => &self.axe,
            PawnWeapon::Knife => &self.knife,
            PawnWeapon::Hammer => &self.hammer,
            PawnWeapon::Pickaxe => &self.pickaxe,
        }
    }

    /// Minimum time between switches as a duration.
    #[must_use]
    pub const fn switch_cooldown(&self) -> Duration {
        Duration::from_millis(self.switch_cooldown_ms)
    }
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            axe: WeaponProfile {
                damage: 20,
                cooldown_ms: 700,
                armor_pierce: 0.25,
            },
            knife: WeaponProfile {
                damage: 10,
                cooldown_ms: 300,
                armor_pierce: 0.0,
            },
            hammer: WeaponProfile {
                damage: 28,
                cooldown_ms: 1000,
                armor_pierce: 0.5,
            },
            pickaxe: WeaponProfile {
                damage: 16,
                cooldown_ms: 600,
                armor_pierce: 1.0,
            },
            switch_cooldown_ms: 1500,
        }
    }
}

/// Ballistics parameters for arrows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Downward acceleration in world units per second squared.
    pub gravity: f32,
    /// Speed used to estimate flight time from distance.
    pub reference_speed: f32,
    /// Lower bound on the estimated flight time, in seconds.
    pub min_flight_secs: f32,
    /// Distance from the target's aim point that counts as a hit.
    pub hit_radius: f32,
    /// Distance beyond the playfield edges at which arrows despawn.
    pub bounds_margin: f32,
    /// Height above the shooter's feet the arrow is released from.
    pub muzzle_height: f32,
    /// Height above the target's feet the arrow aims at.
    pub aim_height: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            gravity: 400.0,
            reference_speed: 250.0,
            min_flight_secs: 0.3,
            hit_radius: 28.0,
            bounds_margin: 50.0,
            muzzle_height: 50.0,
            aim_height: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BattleConfig;
    use crate::{PawnWeapon, UnitKind};

    #[test]
    fn stat_table_matches_kind() {
        let config = BattleConfig::default();
        assert_eq!(config.units.get(UnitKind::Archer).cost, 50);
        assert_eq!(config.units.get(UnitKind::Warrior).armor, 8);
        assert_eq!(config.units.get(UnitKind::Lancer).max_hp, 160);
    }

    #[test]
    fn pickaxe_ignores_all_armor() {
        let config = BattleConfig::default();
        let pickaxe = config.weapons.profile(PawnWeapon::Pickaxe);
        assert!((pickaxe.armor_pierce - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_grid_is_sixteen_by_eight() {
        let grid = BattleConfig::default().grid();
        assert_eq!(grid.dimensions(), (16, 8));
        assert!((grid.width() - 960.0).abs() < f32::EPSILON);
        assert!((grid.height() - 576.0).abs() < f32::EPSILON);
    }
}
