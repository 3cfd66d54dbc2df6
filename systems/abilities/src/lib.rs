#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ability table describing how each unit kind attacks.
//!
//! Every [`UnitKind`] maps to an [`AbilityBundle`]: a delivery mode plus a few
//! plain functions that decide who an attack hits and which animations to
//! play. New kinds are added here and in the stat table without touching the
//! state machine in the world.

use std::fmt;

use rand::{Rng, RngCore};
use skirmish_core::{
    Animation, Battlefield, PawnWeapon, UnitId, UnitKind, UnitSnapshot, WeaponProfile,
};

/// Maximum number of enemies a line-pierce thrust can hit.
pub const LINE_PIERCE_REACH: u32 = 3;

/// Extra distance tolerated when a single-target swing lands.
pub const MELEE_SLACK: f32 = 10.0;

/// Armor at or above which pawns reach for the pickaxe.
pub const HEAVY_ARMOR: u32 = 6;

/// Hit-point ratio at or below which pawns finish with the knife.
pub const FINISHER_RATIO: f32 = 0.3;

/// Hit-point ratio at or above which pawns open with the hammer.
pub const FRESH_RATIO: f32 = 0.7;

/// Resolves which units an attack affects.
pub type ResolveFn = fn(&UnitSnapshot, &UnitSnapshot, &dyn Battlefield) -> Vec<UnitId>;

/// Picks an animation token for a unit.
pub type AnimationFn = fn(&UnitSnapshot, &mut dyn RngCore) -> Animation;

/// How an attack reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Spawns a projectile; damage lands on impact.
    Projectile,
    /// Applies `max(1, damage - armor)` to every resolved target.
    Melee,
    /// Applies the equipped weapon's armor-piercing damage.
    AdaptiveMelee,
    /// Restores hit points to an ally after a cast delay.
    Heal,
}

/// Capability bundle attached to a unit kind.
#[derive(Clone, Copy)]
pub struct AbilityBundle {
    /// How the attack is delivered.
    pub delivery: Delivery,
    /// Who an attack against `primary` affects.
    pub resolve_attack: ResolveFn,
    /// Animation played while winding up.
    pub attack_animation: AnimationFn,
    /// Animation played while recovering.
    pub cooldown_animation: AnimationFn,
}

impl fmt::Debug for AbilityBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityBundle")
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

/// Returns the ability bundle for a unit kind.
#[must_use]
pub fn bundle_for(kind: UnitKind) -> AbilityBundle {
    match kind {
        UnitKind::Archer => AbilityBundle {
            delivery: Delivery::Projectile,
            resolve_attack: resolve_nothing,
            attack_animation: |_, _| Animation::Shoot,
            cooldown_animation: |_, _| Animation::Idle,
        },
        UnitKind::Warrior => AbilityBundle {
            delivery: Delivery::Melee,
            resolve_attack: resolve_single,
            attack_animation: warrior_swing,
            cooldown_animation: |_, _| Animation::Guard,
        },
        UnitKind::Lancer => AbilityBundle {
            delivery: Delivery::Melee,
            resolve_attack: resolve_line,
            attack_animation: |_, _| Animation::Thrust,
            cooldown_animation: |_, _| Animation::Brace,
        },
        UnitKind::Monk => AbilityBundle {
            delivery: Delivery::Heal,
            resolve_attack: resolve_patient,
            attack_animation: |_, _| Animation::Cast,
            cooldown_animation: |_, _| Animation::Idle,
        },
        UnitKind::Pawn => AbilityBundle {
            delivery: Delivery::AdaptiveMelee,
            resolve_attack: resolve_single,
            attack_animation: |unit, _| Animation::Swing(unit.weapon.unwrap_or(PawnWeapon::Axe)),
            cooldown_animation: |_, _| Animation::Idle,
        },
    }
}

/// Standard melee damage: `max(1, damage - armor)`.
#[must_use]
pub fn melee_damage(damage: u32, armor: u32) -> u32 {
    damage.saturating_sub(armor).max(1)
}

/// Pawn weapon damage: `max(1, weapon - armor * (1 - pierce))`, rounded.
#[must_use]
pub fn weapon_damage(profile: &WeaponProfile, armor: u32) -> u32 {
    let pierce = profile.armor_pierce.clamp(0.0, 1.0);
    let raw = profile.damage as f32 - armor as f32 * (1.0 - pierce);
    raw.round().max(1.0) as u32
}

/// Weapon a pawn would prefer against `target`.
///
/// Heavy armor calls for the pickaxe, weakened targets for the knife, fresh
/// targets for the hammer and everything else for the axe.
#[must_use]
pub fn choose_weapon(target: &UnitSnapshot) -> PawnWeapon {
    let ratio = target.hp_ratio();
    if target.armor >= HEAVY_ARMOR {
        PawnWeapon::Pickaxe
    } else if ratio <= FINISHER_RATIO {
        PawnWeapon::Knife
    } else if ratio >= FRESH_RATIO {
        PawnWeapon::Hammer
    } else {
        PawnWeapon::Axe
    }
}

/// Weapon to switch to before attacking `target`, if a switch is warranted.
///
/// Returns `None` while the switch cooldown is running or when the current
/// weapon is already the preferred one.
#[must_use]
pub fn rearm(current: PawnWeapon, switch_ready: bool, target: &UnitSnapshot) -> Option<PawnWeapon> {
    if !switch_ready {
        return None;
    }
    let preferred = choose_weapon(target);
    (preferred != current).then_some(preferred)
}

fn resolve_nothing(_: &UnitSnapshot, _: &UnitSnapshot, _: &dyn Battlefield) -> Vec<UnitId> {
    Vec::new()
}

fn resolve_single(
    attacker: &UnitSnapshot,
    primary: &UnitSnapshot,
    _: &dyn Battlefield,
) -> Vec<UnitId> {
    if is_hostile(attacker, primary)
        && attacker.distance_to(primary) <= attacker.reach + MELEE_SLACK
    {
        vec![primary.id]
    } else {
        Vec::new()
    }
}

fn resolve_line(
    attacker: &UnitSnapshot,
    primary: &UnitSnapshot,
    field: &dyn Battlefield,
) -> Vec<UnitId> {
    let mut hits = Vec::new();
    if let Some(origin) = attacker.cell {
        let dimensions = field.grid().dimensions();
        let step: i64 = if attacker.facing < 0.0 { -1 } else { 1 };
        for distance in 1..=i64::from(LINE_PIERCE_REACH) {
            let Some(cell) = origin.offset(step * distance, 0, dimensions) else {
                break;
            };
            let Some(occupant) = field.occupant(cell) else {
                break;
            };
            if is_hostile(attacker, &occupant) {
                hits.push(occupant.id);
            }
        }
    }

    if hits.is_empty() {
        return resolve_single(attacker, primary, field);
    }
    hits
}

fn resolve_patient(
    healer: &UnitSnapshot,
    patient: &UnitSnapshot,
    _: &dyn Battlefield,
) -> Vec<UnitId> {
    if patient.is_alive() && patient.team == healer.team {
        vec![patient.id]
    } else {
        Vec::new()
    }
}

fn warrior_swing(_: &UnitSnapshot, rng: &mut dyn RngCore) -> Animation {
    if rng.gen_bool(0.5) {
        Animation::Attack1
    } else {
        Animation::Attack2
    }
}

fn is_hostile(attacker: &UnitSnapshot, other: &UnitSnapshot) -> bool {
    other.is_alive() && other.team != attacker.team
}
