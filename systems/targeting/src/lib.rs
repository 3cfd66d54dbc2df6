#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure targeting and steering helpers evaluated once per unit per frame.
//!
//! Candidates are scanned in the order supplied by the caller; the world
//! feeds them in identifier order, which makes every tie-break deterministic.

use std::time::Duration;

use glam::Vec2;
use skirmish_core::{CellCoord, UnitSnapshot};

/// Fraction of full speed applied to vertical movement.
pub const VERTICAL_DAMPING: f32 = 0.35;

/// Distances shorter than this are treated as already arrived.
pub const MIN_STEER_DISTANCE: f32 = 1.0;

/// What a healer should do this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HealOrder {
    /// Start casting on the ally, who is within the heal radius.
    Cast(UnitSnapshot),
    /// Walk towards the nearest injured ally outside the heal radius.
    Approach(UnitSnapshot),
    /// No ally needs healing.
    Rest,
}

/// Selects the nearest living enemy of `unit` by straight-line distance.
///
/// Ties resolve to the candidate scanned first.
#[must_use]
pub fn nearest_enemy<I>(unit: &UnitSnapshot, candidates: I) -> Option<UnitSnapshot>
where
    I: IntoIterator<Item = UnitSnapshot>,
{
    let mut best: Option<(f32, UnitSnapshot)> = None;
    for candidate in candidates {
        if candidate.team == unit.team || !candidate.is_alive() {
            continue;
        }

        let distance = unit.distance_to(&candidate);
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// Chooses the ally a healer should tend to.
///
/// Allies within `radius` are ranked by hit-point percentage, lowest first;
/// when none qualify the nearest injured ally anywhere is approached instead.
/// The healer never selects itself.
#[must_use]
pub fn select_patient<I>(healer: &UnitSnapshot, allies: I, radius: f32) -> HealOrder
where
    I: IntoIterator<Item = UnitSnapshot>,
{
    let mut in_radius: Option<(f32, UnitSnapshot)> = None;
    let mut nearest: Option<(f32, UnitSnapshot)> = None;

    for ally in allies {
        if ally.team != healer.team || ally.id == healer.id || !ally.is_injured() {
            continue;
        }

        let distance = healer.distance_to(&ally);
        if distance <= radius {
            let ratio = ally.hp_ratio();
            match in_radius {
                Some((best_ratio, _)) if ratio >= best_ratio => {}
                _ => in_radius = Some((ratio, ally)),
            }
        }

        match nearest {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => nearest = Some((distance, ally)),
        }
    }

    match (in_radius, nearest) {
        (Some((_, patient)), _) => HealOrder::Cast(patient),
        (None, Some((_, patient))) => HealOrder::Approach(patient),
        (None, None) => HealOrder::Rest,
    }
}

/// Reports whether `target` lies within the attack reach of `unit`.
#[must_use]
pub fn within_reach(unit: &UnitSnapshot, target: &UnitSnapshot) -> bool {
    unit.distance_to(target) <= unit.reach
}

/// Computes the displacement a unit travels towards `toward` during `dt`.
///
/// The vertical component is scaled by `vertical_damping` so closing reads as
/// mostly horizontal. Returns `None` when the goal is closer than
/// [`MIN_STEER_DISTANCE`] or the step would be empty, which keeps zero-length
/// directions from producing NaN positions.
#[must_use]
pub fn steer(
    from: Vec2,
    toward: Vec2,
    speed: f32,
    dt: Duration,
    vertical_damping: f32,
) -> Option<Vec2> {
    let delta = toward - from;
    let length = delta.length();
    if !length.is_finite() || length < MIN_STEER_DISTANCE {
        return None;
    }

    let travel = speed * dt.as_secs_f32();
    if !travel.is_finite() || travel <= 0.0 {
        return None;
    }

    let direction = delta / length;
    Some(Vec2::new(
        direction.x * travel,
        direction.y * travel * vertical_damping,
    ))
}

/// Horizontal facing after moving by `step`, keeping `current` for vertical steps.
#[must_use]
pub fn facing_after(step: Vec2, current: f32) -> f32 {
    if step.x > 0.0 {
        1.0
    } else if step.x < 0.0 {
        -1.0
    } else {
        current
    }
}

/// Cells to try when a friendly unit blocks the way, in preference order.
///
/// Adjacent rows in the current column come first, then the same rows one
/// column forward along `facing`. Cells outside the grid are skipped.
pub fn sidestep_candidates(
    cell: CellCoord,
    facing: f32,
    dimensions: (u32, u32),
) -> impl Iterator<Item = CellCoord> {
    let forward: i64 = if facing < 0.0 { -1 } else { 1 };
    [(0, -1), (0, 1), (forward, -1), (forward, 1)]
        .into_iter()
        .filter_map(move |(columns, rows)| cell.offset(columns, rows, dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::{Team, UnitId, UnitKind, UnitState};

    fn unit(id: u32, team: Team, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: UnitKind::Warrior,
            team,
            state: UnitState::Idle,
            position: Vec2::new(x, y),
            cell: None,
            hp: 100,
            max_hp: 100,
            display_hp: 100.0,
            damage: 10,
            armor: 0,
            reach: 90.0,
            facing: 1.0,
            weapon: None,
            flashing: false,
        }
    }

    fn injured(mut snapshot: UnitSnapshot, hp: u32) -> UnitSnapshot {
        snapshot.hp = hp;
        snapshot
    }

    #[test]
    fn nearest_enemy_ignores_allies_and_the_dead() {
        let me = unit(1, Team::Blue, 0.0, 0.0);
        let ally = unit(2, Team::Blue, 5.0, 0.0);
        let mut corpse = unit(3, Team::Red, 10.0, 0.0);
        corpse.state = UnitState::Dead;
        let far = unit(4, Team::Red, 200.0, 0.0);

        let chosen = nearest_enemy(&me, [me, ally, corpse, far]).expect("enemy");
        assert_eq!(chosen.id, UnitId::new(4));
    }

    #[test]
    fn nearest_enemy_tie_prefers_first_scanned() {
        let me = unit(1, Team::Blue, 100.0, 100.0);
        let left = unit(7, Team::Red, 50.0, 100.0);
        let right = unit(3, Team::Red, 150.0, 100.0);

        let chosen = nearest_enemy(&me, [left, right]).expect("enemy");
        assert_eq!(chosen.id, UnitId::new(7));
    }

    #[test]
    fn nearest_enemy_absent_without_living_opponents() {
        let me = unit(1, Team::Red, 0.0, 0.0);
        assert!(nearest_enemy(&me, [unit(2, Team::Red, 1.0, 1.0)]).is_none());
    }

    #[test]
    fn patient_with_lowest_ratio_in_radius_is_chosen() {
        let healer = unit(1, Team::Blue, 0.0, 0.0);
        let scratched = injured(unit(2, Team::Blue, 30.0, 0.0), 90);
        let wounded = injured(unit(3, Team::Blue, 60.0, 0.0), 40);
        let dying_far = injured(unit(4, Team::Blue, 900.0, 0.0), 5);

        let order = select_patient(&healer, [scratched, wounded, dying_far], 200.0);
        assert_eq!(order, HealOrder::Cast(wounded));
    }

    #[test]
    fn patient_outside_radius_is_approached() {
        let healer = unit(1, Team::Blue, 0.0, 0.0);
        let far = injured(unit(2, Team::Blue, 500.0, 0.0), 50);
        let farther = injured(unit(3, Team::Blue, 800.0, 0.0), 10);

        let order = select_patient(&healer, [farther, far], 200.0);
        assert_eq!(order, HealOrder::Approach(far));
    }

    #[test]
    fn healthy_allies_leave_healer_resting() {
        let healer = injured(unit(1, Team::Blue, 0.0, 0.0), 10);
        let healthy = unit(2, Team::Blue, 10.0, 0.0);
        let enemy = injured(unit(3, Team::Red, 10.0, 0.0), 10);

        let order = select_patient(&healer, [healer, healthy, enemy], 200.0);
        assert_eq!(order, HealOrder::Rest);
    }

    #[test]
    fn reach_is_inclusive() {
        let me = unit(1, Team::Blue, 0.0, 0.0);
        assert!(within_reach(&me, &unit(2, Team::Red, 90.0, 0.0)));
        assert!(!within_reach(&me, &unit(2, Team::Red, 90.5, 0.0)));
    }

    #[test]
    fn steering_damps_vertical_motion() {
        let step = steer(
            Vec2::ZERO,
            Vec2::new(0.0, 100.0),
            100.0,
            Duration::from_secs(1),
            VERTICAL_DAMPING,
        )
        .expect("step");
        assert!(step.x.abs() < f32::EPSILON);
        assert!((step.y - 35.0).abs() < 1e-4);
    }

    #[test]
    fn steering_skips_degenerate_vectors() {
        let origin = Vec2::new(10.0, 10.0);
        assert!(steer(origin, origin, 50.0, Duration::from_millis(16), 1.0).is_none());
        assert!(steer(origin, Vec2::new(200.0, 10.0), 50.0, Duration::ZERO, 1.0).is_none());
    }

    #[test]
    fn facing_follows_horizontal_motion() {
        assert_eq!(facing_after(Vec2::new(-2.0, 0.0), 1.0), -1.0);
        assert_eq!(facing_after(Vec2::new(0.0, 3.0), -1.0), -1.0);
    }

    #[test]
    fn sidestep_tries_adjacent_rows_then_forward_column() {
        let cells: Vec<_> = sidestep_candidates(CellCoord::new(4, 3), -1.0, (16, 8)).collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(4, 2),
                CellCoord::new(4, 4),
                CellCoord::new(3, 2),
                CellCoord::new(3, 4),
            ]
        );
    }

    #[test]
    fn sidestep_skips_cells_outside_grid() {
        let cells: Vec<_> = sidestep_candidates(CellCoord::new(15, 0), 1.0, (16, 8)).collect();
        assert_eq!(cells, vec![CellCoord::new(15, 1)]);
    }
}
