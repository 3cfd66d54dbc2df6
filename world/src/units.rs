//! Combat unit state owned by the world.

use std::time::Duration;

use glam::Vec2;
use skirmish_core::{
    Animation, BattleGrid, CellCoord, Event, PawnWeapon, Team, UnitId, UnitKind, UnitSnapshot,
    UnitState, UnitStats,
};

/// Fraction of the remaining gap the health bar closes each frame.
const DISPLAY_HP_SMOOTHING: f32 = 0.08;

/// Gap below which the health bar snaps to the real value.
const DISPLAY_HP_SNAP: f32 = 0.5;

/// Per-kind extension of the shared unit record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum UnitSpecialization {
    Standard,
    Healer {
        patient: Option<UnitId>,
    },
    Pawn {
        weapon: PawnWeapon,
        switch_cooldown: Duration,
    },
}

impl UnitSpecialization {
    fn for_kind(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Monk => Self::Healer { patient: None },
            UnitKind::Pawn => Self::Pawn {
                weapon: PawnWeapon::Axe,
                switch_cooldown: Duration::ZERO,
            },
            UnitKind::Archer | UnitKind::Warrior | UnitKind::Lancer => Self::Standard,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) team: Team,
    /// Half that paid for the unit and is credited on removal.
    pub(crate) payer: Team,
    pub(crate) state: UnitState,
    pub(crate) position: Vec2,
    pub(crate) cell: Option<CellCoord>,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    pub(crate) display_hp: f32,
    pub(crate) damage: u32,
    pub(crate) armor: u32,
    pub(crate) reach: f32,
    pub(crate) speed: f32,
    pub(crate) facing: f32,
    /// Point inside a sidestep cell the unit is still walking towards.
    pub(crate) waypoint: Option<Vec2>,
    pub(crate) attack_duration: Duration,
    pub(crate) recovery: Duration,
    /// Wind-up, cast delay or cooldown depending on `state`.
    pub(crate) timer: Duration,
    pub(crate) flash: Duration,
    pub(crate) fade: Duration,
    pub(crate) paid: u32,
    pub(crate) bounty: u32,
    pub(crate) specialization: UnitSpecialization,
}

impl Unit {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn(
        id: UnitId,
        kind: UnitKind,
        team: Team,
        payer: Team,
        cell: CellCoord,
        grid: &BattleGrid,
        stats: &UnitStats,
        paid: u32,
    ) -> Self {
        Self {
            id,
            kind,
            team,
            payer,
            state: UnitState::Idle,
            position: grid.cell_center(cell),
            cell: Some(cell),
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            display_hp: stats.max_hp as f32,
            damage: stats.damage,
            armor: stats.armor,
            reach: grid.range_in_world(stats.attack_range_cells),
            speed: stats.speed,
            facing: team.initial_facing(),
            waypoint: None,
            attack_duration: stats.attack_duration(),
            recovery: stats.recovery(),
            timer: Duration::ZERO,
            flash: Duration::ZERO,
            fade: Duration::ZERO,
            paid,
            bounty: stats.bounty,
            specialization: UnitSpecialization::for_kind(kind),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.state.is_dead()
    }

    pub(crate) fn weapon(&self) -> Option<PawnWeapon> {
        match self.specialization {
            UnitSpecialization::Pawn { weapon, .. } => Some(weapon),
            UnitSpecialization::Standard | UnitSpecialization::Healer { .. } => None,
        }
    }

    /// Moves to `to` and announces it; dead units never transition.
    pub(crate) fn transition(&mut self, to: UnitState, animation: Animation, out: &mut Vec<Event>) {
        if self.state.is_dead() {
            return;
        }
        let from = self.state;
        self.state = to;
        out.push(Event::UnitStateChanged {
            unit: self.id,
            from,
            to,
            animation,
        });
    }

    /// Removes up to `amount` hit points and returns the hit points left.
    pub(crate) fn take_damage(&mut self, amount: u32, flash: Duration) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.flash = flash;
        self.hp
    }

    /// Restores hit points capped at the maximum and returns the amount gained.
    pub(crate) fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    /// Advances presentation timers by one frame.
    pub(crate) fn sync_visuals(&mut self, dt: Duration) {
        let target = self.hp as f32;
        self.display_hp += (target - self.display_hp) * DISPLAY_HP_SMOOTHING;
        if (self.display_hp - target).abs() < DISPLAY_HP_SNAP {
            self.display_hp = target;
        }
        self.flash = self.flash.saturating_sub(dt);
        if self.state.is_dead() {
            self.fade = self.fade.saturating_sub(dt);
        }
    }

    pub(crate) fn tick_switch_cooldown(&mut self, dt: Duration) {
        if let UnitSpecialization::Pawn {
            switch_cooldown, ..
        } = &mut self.specialization
        {
            *switch_cooldown = switch_cooldown.saturating_sub(dt);
        }
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            team: self.team,
            state: self.state,
            position: self.position,
            cell: self.cell,
            hp: self.hp,
            max_hp: self.max_hp,
            display_hp: self.display_hp,
            damage: self.damage,
            armor: self.armor,
            reach: self.reach,
            facing: self.facing,
            weapon: self.weapon(),
            flashing: !self.flash.is_zero(),
        }
    }
}
