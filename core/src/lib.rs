#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish battle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for the economy
//! and presentation layers to react to. Systems query immutable snapshots and
//! never mutate world state directly.

mod config;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{
    BattleConfig, HealConfig, ProjectileConfig, UnitStatTable, UnitStats, WeaponProfile,
    WeaponTable,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Skirmish.";

/// Describes the active phase of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Pre-battle setup where units may be placed and removed freely.
    Setup,
    /// Active simulation where units fight and reinforcements cost gold.
    Battle,
}

/// One of the two opposing sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Side that starts on the left half of the battlefield.
    Blue,
    /// Side that starts on the right half of the battlefield.
    Red,
}

impl Team {
    /// Both teams in deterministic order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    /// Returns the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }

    /// Horizontal facing a freshly placed unit of this team adopts.
    ///
    /// Blue faces towards increasing columns, red towards decreasing ones.
    #[must_use]
    pub const fn initial_facing(self) -> f32 {
        match self {
            Self::Blue => 1.0,
            Self::Red => -1.0,
        }
    }
}

/// Types of combat units that can be placed on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Ranged unit that fires arcing arrows.
    Archer,
    /// Melee unit that strikes a single target.
    Warrior,
    /// Melee unit whose thrust pierces several enemies in a line.
    Lancer,
    /// Support unit that heals injured allies.
    Monk,
    /// Melee unit that switches weapons to suit its target.
    Pawn,
}

impl UnitKind {
    /// Every unit kind in deterministic order.
    pub const ALL: [UnitKind; 5] = [
        UnitKind::Archer,
        UnitKind::Warrior,
        UnitKind::Lancer,
        UnitKind::Monk,
        UnitKind::Pawn,
    ];

    /// Reports whether the kind supports allies instead of attacking enemies.
    #[must_use]
    pub const fn is_support(self) -> bool {
        matches!(self, Self::Monk)
    }
}

/// Lifecycle state of a combat unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Waiting for a target.
    Idle,
    /// Closing distance towards a target.
    Moving,
    /// Winding up an attack.
    Attacking,
    /// Recovering after an attack or heal.
    Cooldown,
    /// Casting a heal on an ally.
    Healing,
    /// Terminal state reached at zero hit points.
    Dead,
}

impl UnitState {
    /// Reports whether the state is the terminal `Dead` state.
    #[must_use]
    pub const fn is_dead(self) -> bool {
        matches!(self, Self::Dead)
    }
}

/// Weapons a pawn can switch between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PawnWeapon {
    /// Balanced weapon for mid-health targets.
    Axe,
    /// Fast, light weapon for finishing weakened targets.
    Knife,
    /// Slow, heavy weapon for healthy targets.
    Hammer,
    /// Armor-piercing weapon for heavily armored targets.
    Pickaxe,
}

/// Animation token the presentation layer should play for a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Animation {
    /// Resting loop.
    Idle,
    /// Movement loop.
    Run,
    /// Bow draw and release.
    Shoot,
    /// First sword swing variant.
    Attack1,
    /// Second sword swing variant.
    Attack2,
    /// Defensive stance held while recovering.
    Guard,
    /// Lance thrust.
    Thrust,
    /// Lance held in a defensive brace.
    Brace,
    /// Heal incantation.
    Cast,
    /// Pawn swing with the provided weapon.
    Swing(PawnWeapon),
    /// Death collapse.
    Fall,
}

/// Unique identifier assigned to a combat unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the cell displaced by the provided offsets, if it stays inside
    /// a grid of the given dimensions.
    #[must_use]
    pub fn offset(self, columns: i64, rows: i64, bounds: (u32, u32)) -> Option<CellCoord> {
        let column = i64::from(self.column) + columns;
        let row = i64::from(self.row) + rows;
        if column < 0 || row < 0 || column >= i64::from(bounds.0) || row >= i64::from(bounds.1) {
            return None;
        }
        Some(CellCoord::new(
            u32::try_from(column).ok()?,
            u32::try_from(row).ok()?,
        ))
    }
}

/// Geometry of the battlefield grid in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BattleGrid {
    columns: u32,
    rows: u32,
    cell_width: f32,
    cell_height: f32,
}

impl BattleGrid {
    /// Creates a new grid description.
    ///
    /// Non-positive or non-finite cell sizes would turn every coordinate
    /// conversion into a division by zero, so they collapse to one world unit.
    #[must_use]
    pub fn new(columns: u32, rows: u32, cell_width: f32, cell_height: f32) -> Self {
        Self {
            columns,
            rows,
            cell_width: sanitize_length(cell_width),
            cell_height: sanitize_length(cell_height),
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of a single cell in world units.
    #[must_use]
    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Height of a single cell in world units.
    #[must_use]
    pub const fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// Column and row counts as a tuple.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_width
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_height
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Resolves a world position to the cell containing it.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let column = (position.x / self.cell_width).floor();
        let row = (position.y / self.cell_height).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World position of the centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_width,
            (cell.row() as f32 + 0.5) * self.cell_height,
        )
    }

    /// Team whose half contains the provided cell.
    ///
    /// Columns left of the midpoint belong to blue, the rest to red.
    #[must_use]
    pub const fn half_of(&self, cell: CellCoord) -> Team {
        if cell.column() < self.columns / 2 {
            Team::Blue
        } else {
            Team::Red
        }
    }

    /// Converts a range expressed in cells into a world-unit radius.
    ///
    /// Half a cell is added so a range of one reaches the neighbouring centre
    /// with some tolerance.
    #[must_use]
    pub fn range_in_world(&self, cells: f32) -> f32 {
        cells.max(0.0) * self.cell_width + self.cell_width * 0.5
    }
}

fn sanitize_length(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

/// Read-only snapshot of the gold balances held by the caller's ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Treasury {
    blue: u32,
    red: u32,
}

impl Treasury {
    /// Creates a treasury snapshot with explicit balances.
    #[must_use]
    pub const fn new(blue: u32, red: u32) -> Self {
        Self { blue, red }
    }

    /// Balance held by the provided team.
    #[must_use]
    pub const fn balance(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the battlefield grid, discarding every unit and projectile.
    ConfigureBattlefield {
        /// Number of cell columns.
        columns: u32,
        /// Number of cell rows.
        rows: u32,
        /// Width of a cell in world units.
        cell_width: f32,
        /// Height of a cell in world units.
        cell_height: f32,
    },
    /// Requests placement of a unit at the cell containing `position`.
    PlaceUnit {
        /// Type of unit to create.
        kind: UnitKind,
        /// Team the unit fights for.
        team: Team,
        /// World position that was clicked.
        position: Vec2,
        /// Gold balances the caller currently holds.
        treasury: Treasury,
    },
    /// Requests removal of the unit at the cell containing `position`.
    RemoveUnit {
        /// World position that was clicked.
        position: Vec2,
    },
    /// Requests that the simulation phase begin.
    StartBattle,
    /// Discards all units and projectiles and returns to setup.
    ClearAll,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the battle entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: BattlePhase,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit was created on the battlefield.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Type of the unit.
        kind: UnitKind,
        /// Team the unit fights for.
        team: Team,
        /// Cell the unit occupies.
        cell: CellCoord,
    },
    /// Reports gold spent on a placement.
    UnitPlaced {
        /// Team whose half received the unit and therefore pays for it.
        team: Team,
        /// Gold spent.
        cost: u32,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Type of unit requested.
        kind: UnitKind,
        /// Team requested.
        team: Team,
        /// World position provided in the request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a unit was removed during setup.
    UnitRemoved {
        /// Identifier of the removed unit.
        unit: UnitId,
        /// Team credited with the refund.
        team: Team,
        /// Gold returned.
        refund: u32,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// World position provided in the request.
        position: Vec2,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Reports that a start request was ignored.
    BattleStartRejected {
        /// Specific reason the battle did not start.
        reason: StartError,
    },
    /// Announces a lifecycle transition.
    UnitStateChanged {
        /// Unit that transitioned.
        unit: UnitId,
        /// State before the transition.
        from: UnitState,
        /// State after the transition.
        to: UnitState,
        /// Animation the presentation layer should play.
        animation: Animation,
    },
    /// Confirms that a unit claimed a new grid cell while moving.
    UnitAdvanced {
        /// Unit that moved.
        unit: UnitId,
        /// Cell vacated.
        from: CellCoord,
        /// Cell claimed.
        to: CellCoord,
    },
    /// Announces that a pawn changed weapons.
    WeaponSwitched {
        /// Pawn that switched.
        unit: UnitId,
        /// Weapon now equipped.
        weapon: PawnWeapon,
    },
    /// Feedback cue for a landed melee hit: attacker lunge and target knockback.
    MeleeStruck {
        /// Unit that struck.
        attacker: UnitId,
        /// Unit that was struck.
        target: UnitId,
        /// Horizontal direction of the blow, `1.0` or `-1.0`.
        direction: f32,
    },
    /// Reports hit points lost by a unit.
    UnitDamaged {
        /// Unit that was damaged.
        unit: UnitId,
        /// Unit responsible for the damage.
        attacker: UnitId,
        /// Hit points removed.
        amount: u32,
        /// Hit points left afterwards.
        remaining: u32,
    },
    /// Reports hit points restored to a unit.
    UnitHealed {
        /// Unit that was healed.
        unit: UnitId,
        /// Unit that cast the heal.
        healer: UnitId,
        /// Hit points restored after capping at the maximum.
        amount: u32,
        /// Hit points held afterwards.
        hp: u32,
    },
    /// Confirms that a projectile was fired.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Unit that fired.
        shooter: UnitId,
        /// Unit the projectile is bound to.
        target: UnitId,
    },
    /// Confirms that a projectile struck its bound target.
    ProjectileHit {
        /// Projectile that landed.
        projectile: ProjectileId,
        /// Unit that was struck.
        target: UnitId,
        /// Damage carried by the projectile.
        damage: u32,
    },
    /// Reports that a projectile left play without dealing damage.
    ProjectileExpired {
        /// Projectile that was discarded.
        projectile: ProjectileId,
    },
    /// Announces a death and the bounty owed to the opposing side.
    UnitKilled {
        /// Unit that died.
        unit: UnitId,
        /// Team that earns the bounty.
        reward_team: Team,
        /// Gold earned.
        gold_value: u32,
    },
    /// Announces that at most one side still has living units.
    BattleDecided {
        /// Surviving team, or `None` when both sides were wiped out.
        winner: Option<Team>,
    },
    /// Confirms that the battlefield was reset.
    BattleCleared,
}

/// Reasons a placement request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The position lies outside the grid.
    #[error("position lies outside the battlefield grid")]
    InvalidCell,
    /// The cell already holds a living unit.
    #[error("cell is already occupied")]
    CellOccupied,
    /// The paying team cannot afford the unit.
    #[error("not enough gold for this unit")]
    InsufficientFunds,
}

/// Reasons a removal request may be rejected by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum RemovalError {
    /// Units can only be removed during setup.
    #[error("units can only be removed before the battle starts")]
    InvalidPhase,
    /// The position lies outside the grid.
    #[error("position lies outside the battlefield grid")]
    InvalidCell,
    /// No unit occupies the cell.
    #[error("cell holds no unit")]
    EmptyCell,
}

/// Reasons a start request may be ignored by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum StartError {
    /// The battle is already running.
    #[error("battle already started")]
    InvalidPhase,
    /// One of the rosters is empty.
    #[error("both teams need at least one unit")]
    MissingOpponents,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Type of the unit.
    pub kind: UnitKind,
    /// Team the unit fights for.
    pub team: Team,
    /// Current lifecycle state.
    pub state: UnitState,
    /// World position of the unit's feet.
    pub position: Vec2,
    /// Cell owned by the unit; `None` once dead.
    pub cell: Option<CellCoord>,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Smoothed hit points for health bar rendering.
    pub display_hp: f32,
    /// Base damage per attack.
    pub damage: u32,
    /// Flat damage reduction.
    pub armor: u32,
    /// Attack reach in world units.
    pub reach: f32,
    /// Horizontal facing, `1.0` or `-1.0`.
    pub facing: f32,
    /// Equipped weapon, for pawns only.
    pub weapon: Option<PawnWeapon>,
    /// Indicates whether the damage flash is active.
    pub flashing: bool,
}

impl UnitSnapshot {
    /// Reports whether the unit is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.state.is_dead()
    }

    /// Reports whether the unit lives and is below maximum hit points.
    #[must_use]
    pub const fn is_injured(&self) -> bool {
        self.is_alive() && self.hp < self.max_hp
    }

    /// Fraction of maximum hit points remaining, in `[0, 1]`.
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32
    }

    /// Straight-line distance to another unit.
    #[must_use]
    pub fn distance_to(&self, other: &UnitSnapshot) -> f32 {
        self.position.distance(other.position)
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier assigned to the projectile.
    pub id: ProjectileId,
    /// Unit that fired it.
    pub shooter: UnitId,
    /// Unit the projectile is bound to.
    pub target: UnitId,
    /// Current world position.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Orientation in radians derived from the velocity.
    pub rotation: f32,
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<UnitId>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<UnitId>], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the unit occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell lies in the grid and holds no unit.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.cells.get(index).copied().flatten().is_none())
    }

    /// Returns an iterator over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Option<UnitId>> + 'a {
        self.cells.iter().copied()
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Read access to the battlefield required by attack resolution.
pub trait Battlefield {
    /// Geometry of the grid.
    fn grid(&self) -> BattleGrid;

    /// Snapshot of the living unit holding the provided cell, if any.
    fn occupant(&self, cell: CellCoord) -> Option<UnitSnapshot>;
}
