#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for Skirmish.
//!
//! The world owns the grid, both rosters and every projectile in flight. It
//! mutates state only through [`apply`] and reports everything that happened
//! as [`Event`] values; read access goes through the [`query`] module.

mod occupancy;
mod units;

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    Animation, BattleConfig, BattleGrid, BattlePhase, Battlefield, CellCoord, Command, Event,
    PlacementError, ProjectileId, RemovalError, StartError, Team, Treasury, UnitId, UnitKind,
    UnitSnapshot, UnitState, WELCOME_BANNER,
};
use skirmish_system_abilities::{self as abilities, Delivery};
use skirmish_system_ballistics::{self as ballistics, FlightOutcome, Projectile};
use skirmish_system_targeting::{self as targeting, HealOrder, VERTICAL_DAMPING};
use tracing::{debug, trace};

use crate::occupancy::OccupancyGrid;
use crate::units::{Unit, UnitSpecialization};

const MELEE_FLASH: Duration = Duration::from_millis(120);
const ARROW_FLASH: Duration = Duration::from_millis(100);
const DEATH_FADE: Duration = Duration::from_millis(600);

/// Distance kept from cell borders when picking a sidestep waypoint.
const CELL_INSET: f32 = 1.0;

/// Represents the authoritative Skirmish battle state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: BattleConfig,
    grid: BattleGrid,
    phase: BattlePhase,
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    occupancy: OccupancyGrid,
    next_unit_id: u32,
    next_projectile_id: u32,
    decided: bool,
    rng: ChaCha8Rng,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world in setup using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BattleConfig::default())
    }

    /// Creates a world in setup using the provided configuration.
    #[must_use]
    pub fn with_config(config: BattleConfig) -> Self {
        let grid = config.grid();
        Self {
            banner: WELCOME_BANNER,
            grid,
            phase: BattlePhase::Setup,
            units: Vec::new(),
            projectiles: Vec::new(),
            occupancy: OccupancyGrid::new(grid.columns(), grid.rows()),
            next_unit_id: 0,
            next_projectile_id: 0,
            decided: false,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Places a unit in the cell containing `position`.
    ///
    /// The half the cell lies in pays for the unit whenever a charge applies:
    /// always during battle, and during setup only when the configuration
    /// asks for it. Events describing the placement are appended to `out`.
    pub fn place_unit(
        &mut self,
        kind: UnitKind,
        team: Team,
        position: Vec2,
        treasury: Treasury,
        out: &mut Vec<Event>,
    ) -> Result<UnitId, PlacementError> {
        let cell = self
            .grid
            .cell_at(position)
            .ok_or(PlacementError::InvalidCell)?;
        if self.occupancy.occupant(cell).is_some() {
            return Err(PlacementError::CellOccupied);
        }

        let stats = *self.config.units.get(kind);
        let payer = self.grid.half_of(cell);
        let charged = self.phase == BattlePhase::Battle || self.config.charge_setup_placement;
        if charged && treasury.balance(payer) < stats.cost {
            return Err(PlacementError::InsufficientFunds);
        }

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.saturating_add(1);
        let paid = if charged { stats.cost } else { 0 };
        let unit = Unit::spawn(id, kind, team, payer, cell, &self.grid, &stats, paid);
        self.occupancy.occupy(id, cell);
        self.units.push(unit);

        out.push(Event::UnitSpawned {
            unit: id,
            kind,
            team,
            cell,
        });
        if charged {
            out.push(Event::UnitPlaced {
                team: payer,
                cost: stats.cost,
            });
        }
        if self.phase == BattlePhase::Battle {
            self.decided = false;
        }

        debug!(
            unit = id.get(),
            ?kind,
            ?team,
            column = cell.column(),
            row = cell.row(),
            paid,
            "unit placed"
        );
        Ok(id)
    }

    /// Removes the unit in the cell containing `position` during setup,
    /// refunding whatever it paid.
    pub fn remove_unit(
        &mut self,
        position: Vec2,
        out: &mut Vec<Event>,
    ) -> Result<UnitId, RemovalError> {
        if self.phase != BattlePhase::Setup {
            return Err(RemovalError::InvalidPhase);
        }
        let cell = self
            .grid
            .cell_at(position)
            .ok_or(RemovalError::InvalidCell)?;
        let id = self
            .occupancy
            .occupant(cell)
            .ok_or(RemovalError::EmptyCell)?;
        let index = self.unit_index(id).ok_or(RemovalError::EmptyCell)?;

        let unit = self.units.remove(index);
        self.occupancy.vacate(id, cell);
        out.push(Event::UnitRemoved {
            unit: id,
            team: unit.payer,
            refund: unit.paid,
        });
        debug!(unit = id.get(), refund = unit.paid, "unit removed");
        Ok(id)
    }

    /// Enters the battle phase once both teams field at least one unit.
    pub fn start_battle(&mut self, out: &mut Vec<Event>) -> Result<(), StartError> {
        if self.phase == BattlePhase::Battle {
            return Err(StartError::InvalidPhase);
        }
        if !Team::ALL.into_iter().all(|team| self.has_living(team)) {
            return Err(StartError::MissingOpponents);
        }

        self.phase = BattlePhase::Battle;
        self.decided = false;
        out.push(Event::PhaseChanged {
            phase: BattlePhase::Battle,
        });
        debug!(units = self.units.len(), "battle started");
        Ok(())
    }

    fn clear_all(&mut self, out: &mut Vec<Event>) {
        self.units.clear();
        self.projectiles.clear();
        self.occupancy.clear();
        self.decided = false;
        if self.phase != BattlePhase::Setup {
            self.phase = BattlePhase::Setup;
            out.push(Event::PhaseChanged {
                phase: BattlePhase::Setup,
            });
        }
        out.push(Event::BattleCleared);
        debug!("battlefield cleared");
    }

    fn configure(
        &mut self,
        columns: u32,
        rows: u32,
        cell_width: f32,
        cell_height: f32,
        out: &mut Vec<Event>,
    ) {
        self.grid = BattleGrid::new(columns, rows, cell_width, cell_height);
        self.config.columns = columns;
        self.config.rows = rows;
        self.config.cell_width = self.grid.cell_width();
        self.config.cell_height = self.grid.cell_height();
        self.occupancy = OccupancyGrid::new(columns, rows);
        self.clear_all(out);
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        out.push(Event::TimeAdvanced { dt });

        if self.phase == BattlePhase::Battle {
            for index in 0..self.units.len() {
                self.update_unit(index, dt, out);
            }
            self.update_projectiles(dt, out);
        }

        for unit in &mut self.units {
            unit.sync_visuals(dt);
        }
        self.units.retain(|unit| unit.is_alive() || !unit.fade.is_zero());

        if self.phase == BattlePhase::Battle {
            self.check_outcome(out);
        }
    }

    fn update_unit(&mut self, index: usize, dt: Duration, out: &mut Vec<Event>) {
        let Some(unit) = self.units.get_mut(index) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        unit.tick_switch_cooldown(dt);

        let state = unit.state;
        match state {
            UnitState::Cooldown => {
                unit.timer = unit.timer.saturating_sub(dt);
                if unit.timer.is_zero() {
                    unit.transition(UnitState::Idle, Animation::Idle, out);
                }
            }
            UnitState::Healing => {
                unit.timer = unit.timer.saturating_sub(dt);
                if unit.timer.is_zero() {
                    self.finish_heal(index, out);
                }
            }
            _ if unit.kind.is_support() => self.update_healer(index, dt, out),
            _ => self.update_fighter(index, dt, out),
        }
    }

    fn update_fighter(&mut self, index: usize, dt: Duration, out: &mut Vec<Event>) {
        let snapshot = self.units[index].snapshot();
        let Some(target) =
            targeting::nearest_enemy(&snapshot, self.units.iter().map(Unit::snapshot))
        else {
            if snapshot.state != UnitState::Idle {
                self.units[index].transition(UnitState::Idle, Animation::Idle, out);
            }
            return;
        };
        let in_reach = targeting::within_reach(&snapshot, &target);

        match snapshot.state {
            UnitState::Attacking => {
                let unit = &mut self.units[index];
                unit.timer = unit.timer.saturating_sub(dt);
                if unit.timer.is_zero() {
                    self.complete_attack(index, &target, out);
                }
            }
            _ if in_reach => self.begin_attack(index, &target, out),
            _ => {
                if snapshot.state != UnitState::Moving {
                    self.units[index].transition(UnitState::Moving, Animation::Run, out);
                }
                self.advance_towards(index, target.position, dt, out);
            }
        }
    }

    fn begin_attack(&mut self, index: usize, target: &UnitSnapshot, out: &mut Vec<Event>) {
        let switch_cooldown = self.config.weapons.switch_cooldown();
        let unit = &mut self.units[index];
        if let UnitSpecialization::Pawn {
            weapon,
            switch_cooldown: remaining,
        } = &mut unit.specialization
        {
            if let Some(next) = abilities::rearm(*weapon, remaining.is_zero(), target) {
                *weapon = next;
                *remaining = switch_cooldown;
                out.push(Event::WeaponSwitched {
                    unit: unit.id,
                    weapon: next,
                });
                debug!(unit = unit.id.get(), weapon = ?next, "weapon switched");
            }
        }

        unit.timer = unit.attack_duration;
        let bundle = abilities::bundle_for(unit.kind);
        let animation = (bundle.attack_animation)(&unit.snapshot(), &mut self.rng);
        unit.transition(UnitState::Attacking, animation, out);
    }

    fn complete_attack(&mut self, index: usize, primary: &UnitSnapshot, out: &mut Vec<Event>) {
        let attacker = self.units[index].snapshot();
        let bundle = abilities::bundle_for(attacker.kind);

        match bundle.delivery {
            Delivery::Projectile => {
                self.launch_projectile(&attacker, primary, out);
                let unit = &mut self.units[index];
                if targeting::within_reach(&attacker, primary) {
                    unit.timer = unit.attack_duration;
                } else {
                    unit.timer = unit.recovery;
                    let animation = (bundle.cooldown_animation)(&attacker, &mut self.rng);
                    unit.transition(UnitState::Cooldown, animation, out);
                }
            }
            Delivery::Melee | Delivery::AdaptiveMelee => {
                let weapon = attacker
                    .weapon
                    .filter(|_| bundle.delivery == Delivery::AdaptiveMelee)
                    .map(|weapon| *self.config.weapons.profile(weapon));
                let hits = (bundle.resolve_attack)(&attacker, primary, &*self);
                for id in hits {
                    let Some(target_index) = self.unit_index(id) else {
                        continue;
                    };
                    let armor = self.units[target_index].armor;
                    let amount = match &weapon {
                        Some(profile) => abilities::weapon_damage(profile, armor),
                        None => abilities::melee_damage(attacker.damage, armor),
                    };
                    out.push(Event::MeleeStruck {
                        attacker: attacker.id,
                        target: id,
                        direction: attacker.facing.signum(),
                    });
                    self.apply_damage(target_index, attacker.id, amount, MELEE_FLASH, out);
                }

                let extra = weapon.map_or(Duration::ZERO, |profile| profile.cooldown());
                let unit = &mut self.units[index];
                unit.timer = unit.attack_duration + unit.recovery + extra;
                let animation = (bundle.cooldown_animation)(&attacker, &mut self.rng);
                unit.transition(UnitState::Cooldown, animation, out);
            }
            Delivery::Heal => {}
        }
    }

    fn update_healer(&mut self, index: usize, dt: Duration, out: &mut Vec<Event>) {
        let snapshot = self.units[index].snapshot();
        let radius = self.grid.range_in_world(self.config.heal.radius_cells);
        let order =
            targeting::select_patient(&snapshot, self.units.iter().map(Unit::snapshot), radius);

        match order {
            HealOrder::Cast(patient) => {
                let cast_delay = self.config.heal.cast_delay();
                let unit = &mut self.units[index];
                if let UnitSpecialization::Healer { patient: slot } = &mut unit.specialization {
                    *slot = Some(patient.id);
                }
                unit.timer = cast_delay;
                let bundle = abilities::bundle_for(unit.kind);
                let animation = (bundle.attack_animation)(&snapshot, &mut self.rng);
                unit.transition(UnitState::Healing, animation, out);
            }
            HealOrder::Approach(patient) => {
                if snapshot.state != UnitState::Moving {
                    self.units[index].transition(UnitState::Moving, Animation::Run, out);
                }
                self.advance_towards(index, patient.position, dt, out);
            }
            HealOrder::Rest => {
                if snapshot.state != UnitState::Idle {
                    self.units[index].transition(UnitState::Idle, Animation::Idle, out);
                }
            }
        }
    }

    fn finish_heal(&mut self, index: usize, out: &mut Vec<Event>) {
        let healer = self.units[index].snapshot();
        let bundle = abilities::bundle_for(healer.kind);
        let patient = match self.units[index].specialization {
            UnitSpecialization::Healer { patient } => patient,
            UnitSpecialization::Standard | UnitSpecialization::Pawn { .. } => None,
        };

        if let Some(patient_index) = patient.and_then(|id| self.unit_index(id)) {
            let snapshot = self.units[patient_index].snapshot();
            let accepted = (bundle.resolve_attack)(&healer, &snapshot, &*self);
            if !accepted.is_empty() {
                let patient = &mut self.units[patient_index];
                let restored = patient.heal(self.config.heal.amount);
                out.push(Event::UnitHealed {
                    unit: patient.id,
                    healer: healer.id,
                    amount: restored,
                    hp: patient.hp,
                });
            }
        }

        let unit = &mut self.units[index];
        if let UnitSpecialization::Healer { patient } = &mut unit.specialization {
            *patient = None;
        }
        unit.timer = unit.attack_duration + unit.recovery;
        let animation = (bundle.cooldown_animation)(&healer, &mut self.rng);
        unit.transition(UnitState::Cooldown, animation, out);
    }

    fn advance_towards(&mut self, index: usize, goal: Vec2, dt: Duration, out: &mut Vec<Event>) {
        let grid = self.grid;
        let unit = &mut self.units[index];
        if let Some(waypoint) = unit.waypoint {
            let travel = unit.speed * dt.as_secs_f32();
            if travel.is_nan() || travel <= 0.0 {
                return;
            }
            let step = targeting::steer(unit.position, waypoint, unit.speed, dt, 1.0)
                .filter(|_| unit.position.distance(waypoint) > travel);
            match step {
                Some(step) => {
                    unit.facing = targeting::facing_after(step, unit.facing);
                    unit.position += step;
                }
                None => {
                    unit.position = waypoint;
                    unit.waypoint = None;
                }
            }
            return;
        }

        let Some(step) = targeting::steer(unit.position, goal, unit.speed, dt, VERTICAL_DAMPING)
        else {
            return;
        };
        unit.facing = targeting::facing_after(step, unit.facing);
        let Some(current) = unit.cell else {
            return;
        };
        let next = unit.position + step;
        let (facing, team) = (unit.facing, unit.team);

        let Some(next_cell) = grid.cell_at(next) else {
            return;
        };
        if next_cell == current {
            unit.position = next;
            return;
        }

        match self.occupancy.occupant(next_cell) {
            None => {
                self.claim(index, current, next_cell, out);
                self.units[index].position = next;
            }
            Some(other) => {
                let friendly = self
                    .unit_index(other)
                    .is_some_and(|other| self.units[other].team == team);
                if !friendly {
                    return;
                }
                let detour = targeting::sidestep_candidates(current, facing, grid.dimensions())
                    .find(|cell| self.occupancy.is_free(*cell));
                if let Some(cell) = detour {
                    self.claim(index, current, cell, out);
                    let unit = &mut self.units[index];
                    unit.waypoint = Some(clamp_into(&grid, cell, unit.position));
                }
            }
        }
    }

    fn claim(&mut self, index: usize, from: CellCoord, to: CellCoord, out: &mut Vec<Event>) {
        let unit = &mut self.units[index];
        self.occupancy.vacate(unit.id, from);
        self.occupancy.occupy(unit.id, to);
        unit.cell = Some(to);
        out.push(Event::UnitAdvanced {
            unit: unit.id,
            from,
            to,
        });
    }

    fn launch_projectile(
        &mut self,
        shooter: &UnitSnapshot,
        target: &UnitSnapshot,
        out: &mut Vec<Event>,
    ) {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        let config = &self.config.projectile;
        let projectile = Projectile::launch(
            id,
            shooter.id,
            target.id,
            ballistics::muzzle(shooter.position, config),
            ballistics::aim_point(target.position, config),
            shooter.damage,
            config,
        );
        trace!(
            projectile = id.get(),
            shooter = shooter.id.get(),
            target = target.id.get(),
            "projectile launched"
        );
        self.projectiles.push(projectile);
        out.push(Event::ProjectileLaunched {
            projectile: id,
            shooter: shooter.id,
            target: target.id,
        });
    }

    fn update_projectiles(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let config = self.config.projectile;
        let mut projectiles = std::mem::take(&mut self.projectiles);
        projectiles.retain_mut(|projectile| {
            projectile.advance(dt);
            let target_index = self.unit_index(projectile.target());
            let aim = target_index.map(|index| ballistics::aim_point(self.units[index].position, &config));

            match projectile.resolve(aim, &self.grid, &config) {
                FlightOutcome::InFlight => true,
                FlightOutcome::Hit => {
                    match target_index.filter(|index| self.units[*index].is_alive()) {
                        Some(index) => {
                            trace!(projectile = projectile.id().get(), "projectile hit");
                            out.push(Event::ProjectileHit {
                                projectile: projectile.id(),
                                target: projectile.target(),
                                damage: projectile.damage(),
                            });
                            self.apply_damage(
                                index,
                                projectile.shooter(),
                                projectile.damage(),
                                ARROW_FLASH,
                                out,
                            );
                        }
                        None => out.push(Event::ProjectileExpired {
                            projectile: projectile.id(),
                        }),
                    }
                    false
                }
                FlightOutcome::OutOfBounds => {
                    out.push(Event::ProjectileExpired {
                        projectile: projectile.id(),
                    });
                    false
                }
            }
        });
        self.projectiles = projectiles;
    }

    fn apply_damage(
        &mut self,
        index: usize,
        attacker: UnitId,
        amount: u32,
        flash: Duration,
        out: &mut Vec<Event>,
    ) {
        let unit = &mut self.units[index];
        if !unit.is_alive() {
            return;
        }
        let remaining = unit.take_damage(amount, flash);
        out.push(Event::UnitDamaged {
            unit: unit.id,
            attacker,
            amount,
            remaining,
        });
        if remaining == 0 {
            self.kill(index, out);
        }
    }

    fn kill(&mut self, index: usize, out: &mut Vec<Event>) {
        let unit = &mut self.units[index];
        if !unit.is_alive() {
            return;
        }
        unit.transition(UnitState::Dead, Animation::Fall, out);
        if let Some(cell) = unit.cell.take() {
            self.occupancy.vacate(unit.id, cell);
        }
        unit.timer = Duration::ZERO;
        unit.fade = DEATH_FADE;
        if let UnitSpecialization::Healer { patient } = &mut unit.specialization {
            *patient = None;
        }

        let reward_team = unit.team.opponent();
        out.push(Event::UnitKilled {
            unit: unit.id,
            reward_team,
            gold_value: unit.bounty,
        });
        debug!(unit = unit.id.get(), kind = ?unit.kind, ?reward_team, "unit killed");
    }

    fn check_outcome(&mut self, out: &mut Vec<Event>) {
        if self.decided {
            return;
        }
        let winner = match (self.has_living(Team::Blue), self.has_living(Team::Red)) {
            (true, true) => return,
            (true, false) => Some(Team::Blue),
            (false, true) => Some(Team::Red),
            (false, false) => None,
        };
        self.decided = true;
        debug!(?winner, "battle decided");
        out.push(Event::BattleDecided { winner });
    }

    fn has_living(&self, team: Team) -> bool {
        self.units
            .iter()
            .any(|unit| unit.team == team && unit.is_alive())
    }

    fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |unit| unit.id).ok()
    }
}

impl Battlefield for World {
    fn grid(&self) -> BattleGrid {
        self.grid
    }

    fn occupant(&self, cell: CellCoord) -> Option<UnitSnapshot> {
        let id = self.occupancy.occupant(cell)?;
        let index = self.unit_index(id)?;
        self.units.get(index).map(Unit::snapshot)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBattlefield {
            columns,
            rows,
            cell_width,
            cell_height,
        } => world.configure(columns, rows, cell_width, cell_height, out_events),
        Command::PlaceUnit {
            kind,
            team,
            position,
            treasury,
        } => {
            if let Err(reason) = world.place_unit(kind, team, position, treasury, out_events) {
                debug!(?kind, ?team, %reason, "placement rejected");
                out_events.push(Event::PlacementRejected {
                    kind,
                    team,
                    position,
                    reason,
                });
            }
        }
        Command::RemoveUnit { position } => {
            if let Err(reason) = world.remove_unit(position, out_events) {
                debug!(%reason, "removal rejected");
                out_events.push(Event::RemovalRejected { position, reason });
            }
        }
        Command::StartBattle => {
            if let Err(reason) = world.start_battle(out_events) {
                debug!(%reason, "battle start rejected");
                out_events.push(Event::BattleStartRejected { reason });
            }
        }
        Command::ClearAll => world.clear_all(out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

fn clamp_into(grid: &BattleGrid, cell: CellCoord, position: Vec2) -> Vec2 {
    let min_x = cell.column() as f32 * grid.cell_width() + CELL_INSET;
    let max_x = (cell.column() + 1) as f32 * grid.cell_width() - CELL_INSET;
    let min_y = cell.row() as f32 * grid.cell_height() + CELL_INSET;
    let max_y = (cell.row() + 1) as f32 * grid.cell_height() - CELL_INSET;
    Vec2::new(
        position.x.max(min_x).min(max_x),
        position.y.max(min_y).min(max_y),
    )
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use skirmish_core::{
        BattleConfig, BattleGrid, BattlePhase, CellCoord, OccupancyView, ProjectileSnapshot, Team,
        UnitId, UnitSnapshot,
    };

    use super::{Unit, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Phase the battle is in.
    #[must_use]
    pub fn phase(world: &World) -> BattlePhase {
        world.phase
    }

    /// Geometry of the battlefield grid.
    #[must_use]
    pub fn grid(world: &World) -> BattleGrid {
        world.grid
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &BattleConfig {
        &world.config
    }

    /// Captures every unit, including fading corpses, ordered by identifier.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView {
            snapshots: world.units.iter().map(Unit::snapshot).collect(),
        }
    }

    /// Snapshot of a single unit, if it is still tracked.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world
            .unit_index(id)
            .and_then(|index| world.units.get(index))
            .map(Unit::snapshot)
    }

    /// Living units fighting for `team`, ordered by identifier.
    #[must_use]
    pub fn roster(world: &World, team: Team) -> Vec<UnitSnapshot> {
        world
            .units
            .iter()
            .filter(|unit| unit.team == team && unit.is_alive())
            .map(Unit::snapshot)
            .collect()
    }

    /// Projectiles currently in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.occupancy.view()
    }

    /// Resolves a world position to a grid cell.
    #[must_use]
    pub fn cell_at(world: &World, position: Vec2) -> Option<CellCoord> {
        world.grid.cell_at(position)
    }

    /// Team whose half contains `cell`.
    #[must_use]
    pub fn half_of(world: &World, cell: CellCoord) -> Team {
        world.grid.half_of(cell)
    }

    /// Read-only snapshot describing all tracked units.
    #[derive(Clone, Debug)]
    pub struct UnitView {
        snapshots: Vec<UnitSnapshot>,
    }

    impl UnitView {
        /// Iterator over the captured unit snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<UnitSnapshot> {
            self.snapshots
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(world: &mut World, millis: u64, events: &mut Vec<Event>) {
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            events,
        );
    }

    fn place(world: &mut World, kind: UnitKind, team: Team, column: u32, row: u32) -> UnitId {
        let mut events = Vec::new();
        let position = world.grid.cell_center(CellCoord::new(column, row));
        world
            .place_unit(kind, team, position, Treasury::default(), &mut events)
            .expect("placement")
    }

    #[test]
    fn configure_rebuilds_grid_and_clears_units() {
        let mut world = World::new();
        let _ = place(&mut world, UnitKind::Archer, Team::Blue, 1, 1);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ConfigureBattlefield {
                columns: 10,
                rows: 4,
                cell_width: 32.0,
                cell_height: 0.0,
            },
            &mut events,
        );

        let grid = query::grid(&world);
        assert_eq!(grid.dimensions(), (10, 4));
        assert!((grid.cell_height() - 1.0).abs() < f32::EPSILON);
        assert!(world.units.is_empty());
        assert_eq!(events, vec![Event::BattleCleared]);
        assert_eq!(query::occupancy_view(&world).dimensions(), (10, 4));
    }

    #[test]
    fn healer_rests_then_heals_injured_ally() {
        let mut world = World::new();
        let monk = place(&mut world, UnitKind::Monk, Team::Blue, 2, 3);
        let warrior = place(&mut world, UnitKind::Warrior, Team::Blue, 3, 3);
        let _ = place(&mut world, UnitKind::Archer, Team::Red, 15, 7);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        events.clear();
        tick(&mut world, 100, &mut events);
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Idle),
            "healer should rest while nobody is hurt"
        );

        let index = world.unit_index(warrior).expect("warrior");
        world.units[index].hp = 190;

        events.clear();
        tick(&mut world, 100, &mut events);
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Healing)
        );

        let mut healed = None;
        for _ in 0..6 {
            events.clear();
            tick(&mut world, 100, &mut events);
            healed = healed.or_else(|| {
                events.iter().find_map(|event| match event {
                    Event::UnitHealed { amount, hp, .. } => Some((*amount, *hp)),
                    _ => None,
                })
            });
        }
        assert_eq!(healed, Some((10, 200)), "heal must cap at max hp");
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Cooldown)
        );

        world.units[index].hp = 100;
        events.clear();
        tick(&mut world, 100, &mut events);
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Cooldown),
            "no new cast while cooling down"
        );
    }

    #[test]
    fn heal_is_skipped_when_patient_dies_mid_cast() {
        let mut world = World::new();
        let monk = place(&mut world, UnitKind::Monk, Team::Blue, 2, 3);
        let warrior = place(&mut world, UnitKind::Warrior, Team::Blue, 3, 3);
        let _ = place(&mut world, UnitKind::Archer, Team::Red, 15, 7);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        let index = world.unit_index(warrior).expect("warrior");
        world.units[index].hp = 50;
        tick(&mut world, 100, &mut events);
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Healing)
        );

        world.kill(index, &mut events);
        events.clear();
        for _ in 0..6 {
            tick(&mut world, 100, &mut events);
        }
        assert!(events
            .iter()
            .all(|event| !matches!(event, Event::UnitHealed { .. })));
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Cooldown)
        );
    }

    #[test]
    fn friendly_blocker_triggers_gradual_sidestep() {
        let mut world = World::new();
        let warrior = place(&mut world, UnitKind::Warrior, Team::Blue, 3, 3);
        let _ = place(&mut world, UnitKind::Monk, Team::Blue, 4, 3);
        let _ = place(&mut world, UnitKind::Monk, Team::Red, 12, 3);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        let index = world.unit_index(warrior).expect("warrior");
        let limit = world.units[index].speed * 0.016 + 1e-3;
        let mut waypoint_seen = false;
        events.clear();
        for frame in 0..300 {
            let before = world.units[index].position;
            tick(&mut world, 16, &mut events);
            let unit = &world.units[index];
            let moved = unit.position.distance(before);
            assert!(moved <= limit, "jumped {moved} units in frame {frame}");
            match unit.waypoint {
                Some(_) => waypoint_seen = true,
                None => assert_eq!(world.grid.cell_at(unit.position), unit.cell),
            }
        }

        assert!(waypoint_seen, "sidestep should walk to its cell");
        assert!(events.contains(&Event::UnitAdvanced {
            unit: warrior,
            from: CellCoord::new(3, 3),
            to: CellCoord::new(3, 2),
        }));
    }

    fn relocate(world: &mut World, id: UnitId, cell: CellCoord) {
        let index = world.unit_index(id).expect("unit");
        let from = world.units[index].cell.expect("living unit owns a cell");
        world.occupancy.vacate(id, from);
        world.occupancy.occupy(id, cell);
        world.units[index].cell = Some(cell);
        world.units[index].position = world.grid.cell_center(cell);
    }

    fn transitions_of(events: &[Event], id: UnitId) -> Vec<UnitState> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::UnitStateChanged { unit, to, .. } if *unit == id => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn archer_still_fires_when_target_slips_out_of_reach() {
        let mut world = World::new();
        let archer = place(&mut world, UnitKind::Archer, Team::Blue, 2, 3);
        let monk = place(&mut world, UnitKind::Monk, Team::Red, 6, 3);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        tick(&mut world, 16, &mut events);
        assert_eq!(
            query::unit(&world, archer).map(|unit| unit.state),
            Some(UnitState::Attacking)
        );

        relocate(&mut world, monk, CellCoord::new(12, 3));
        events.clear();
        for _ in 0..60 {
            tick(&mut world, 16, &mut events);
        }

        let launched = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileLaunched { shooter, .. } if *shooter == archer))
            .count();
        assert_eq!(launched, 1);
        assert_eq!(
            transitions_of(&events, archer).first(),
            Some(&UnitState::Cooldown),
            "wind-up completes before the archer moves again"
        );
    }

    #[test]
    fn melee_swing_whiffs_when_target_slips_out_of_reach() {
        let mut world = World::new();
        let warrior = place(&mut world, UnitKind::Warrior, Team::Blue, 5, 3);
        let monk = place(&mut world, UnitKind::Monk, Team::Red, 6, 3);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        tick(&mut world, 16, &mut events);
        assert_eq!(
            query::unit(&world, warrior).map(|unit| unit.state),
            Some(UnitState::Attacking)
        );

        relocate(&mut world, monk, CellCoord::new(9, 3));
        events.clear();
        for _ in 0..40 {
            tick(&mut world, 16, &mut events);
        }

        assert!(!events.iter().any(|event| matches!(
            event,
            Event::UnitDamaged { .. } | Event::MeleeStruck { .. }
        )));
        assert_eq!(
            transitions_of(&events, warrior).first(),
            Some(&UnitState::Cooldown)
        );
    }

    #[test]
    fn clearing_voids_projectiles_casts_and_cooldowns() {
        let mut world = World::new();
        let archer = place(&mut world, UnitKind::Archer, Team::Blue, 2, 3);
        let monk = place(&mut world, UnitKind::Monk, Team::Blue, 2, 4);
        let _ = place(&mut world, UnitKind::Warrior, Team::Blue, 7, 5);
        let _ = place(&mut world, UnitKind::Monk, Team::Red, 6, 3);
        let _ = place(&mut world, UnitKind::Warrior, Team::Red, 8, 5);
        let mut events = Vec::new();
        world.start_battle(&mut events).expect("start");

        for _ in 0..120 {
            tick(&mut world, 16, &mut events);
            if !world.projectiles.is_empty() {
                break;
            }
        }
        assert!(!world.projectiles.is_empty(), "archer never fired");

        let index = world.unit_index(archer).expect("archer");
        world.units[index].hp = 50;
        tick(&mut world, 16, &mut events);

        assert!(!world.projectiles.is_empty(), "arrow should still be in flight");
        assert_eq!(
            query::unit(&world, monk).map(|unit| unit.state),
            Some(UnitState::Healing)
        );
        assert!(world
            .units
            .iter()
            .any(|unit| unit.state == UnitState::Cooldown));

        events.clear();
        apply(&mut world, Command::ClearAll, &mut events);
        let _ = place(&mut world, UnitKind::Archer, Team::Blue, 0, 0);
        let _ = place(&mut world, UnitKind::Archer, Team::Red, 15, 7);
        world.start_battle(&mut events).expect("restart");

        events.clear();
        for _ in 0..120 {
            tick(&mut world, 16, &mut events);
        }
        assert!(!events.iter().any(|event| matches!(
            event,
            Event::ProjectileHit { .. }
                | Event::ProjectileExpired { .. }
                | Event::UnitHealed { .. }
                | Event::UnitDamaged { .. }
                | Event::MeleeStruck { .. }
        )));
    }

    #[test]
    fn occupant_reports_living_units_only() {
        let mut world = World::new();
        let archer = place(&mut world, UnitKind::Archer, Team::Blue, 0, 0);
        let cell = CellCoord::new(0, 0);
        assert_eq!(world.occupant(cell).map(|unit| unit.id), Some(archer));

        let mut events = Vec::new();
        let index = world.unit_index(archer).expect("archer");
        world.kill(index, &mut events);
        assert!(world.occupant(cell).is_none());
        assert!(query::occupancy_view(&world).is_free(cell));
    }
}
