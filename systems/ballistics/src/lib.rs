#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Arcing projectile flight under constant gravity.
//!
//! A projectile is launched with a velocity that would carry it to its aim
//! point after an estimated flight time, then integrated every frame with
//! semi-implicit Euler steps. Impact is checked against the bound target's
//! live aim point, so arrows track a moving target only through gravity and
//! the hit radius, never by steering.

use std::time::Duration;

use glam::Vec2;
use skirmish_core::{BattleGrid, ProjectileConfig, ProjectileId, ProjectileSnapshot, UnitId};

/// Result of checking a projectile after it advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlightOutcome {
    /// Still travelling.
    InFlight,
    /// Within the hit radius of the target's aim point.
    Hit,
    /// Left the playfield plus margin without hitting.
    OutOfBounds,
}

/// Initial velocity that carries a projectile from `origin` to `aim`.
///
/// Flight time is estimated from distance at the reference speed and floored
/// at the configured minimum, so very short shots still arc.
#[must_use]
pub fn launch_velocity(origin: Vec2, aim: Vec2, config: &ProjectileConfig) -> Vec2 {
    let delta = aim - origin;
    let reference_speed = if config.reference_speed > 0.0 {
        config.reference_speed
    } else {
        1.0
    };
    let flight = (delta.length() / reference_speed).max(config.min_flight_secs.max(f32::EPSILON));
    Vec2::new(
        delta.x / flight,
        delta.y / flight - config.gravity * flight * 0.5,
    )
}

/// A projectile bound to a single target.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    id: ProjectileId,
    shooter: UnitId,
    target: UnitId,
    position: Vec2,
    velocity: Vec2,
    gravity: f32,
    damage: u32,
}

impl Projectile {
    /// Launches a projectile from `origin` towards `aim`.
    #[must_use]
    pub fn launch(
        id: ProjectileId,
        shooter: UnitId,
        target: UnitId,
        origin: Vec2,
        aim: Vec2,
        damage: u32,
        config: &ProjectileConfig,
    ) -> Self {
        Self {
            id,
            shooter,
            target,
            position: origin,
            velocity: launch_velocity(origin, aim, config),
            gravity: config.gravity,
            damage,
        }
    }

    /// Identifier of the projectile.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Unit that fired the projectile.
    #[must_use]
    pub const fn shooter(&self) -> UnitId {
        self.shooter
    }

    /// Unit the projectile is bound to.
    #[must_use]
    pub const fn target(&self) -> UnitId {
        self.target
    }

    /// Damage delivered on impact.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Orientation in radians following the velocity.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.velocity.y.atan2(self.velocity.x)
    }

    /// Downward acceleration captured at launch.
    #[must_use]
    pub const fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Integrates gravity and velocity over `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        self.velocity.y += self.gravity * seconds;
        self.position += self.velocity * seconds;
    }

    /// Checks for impact against `aim` and for leaving the playfield.
    ///
    /// `aim` is `None` when the bound target no longer exists; such a
    /// projectile keeps flying until it leaves the bounds.
    #[must_use]
    pub fn resolve(
        &self,
        aim: Option<Vec2>,
        grid: &BattleGrid,
        config: &ProjectileConfig,
    ) -> FlightOutcome {
        if let Some(aim) = aim {
            if self.position.distance(aim) < config.hit_radius {
                return FlightOutcome::Hit;
            }
        }

        let margin = config.bounds_margin;
        if !self.position.is_finite()
            || self.position.x < -margin
            || self.position.x > grid.width() + margin
            || self.position.y > grid.height() + margin
        {
            return FlightOutcome::OutOfBounds;
        }
        FlightOutcome::InFlight
    }

    /// Captures an immutable view of the projectile.
    #[must_use]
    pub fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            shooter: self.shooter,
            target: self.target,
            position: self.position,
            velocity: self.velocity,
            rotation: self.rotation(),
        }
    }
}

/// Where an arrow leaves a shooter standing at `feet`.
#[must_use]
pub fn muzzle(feet: Vec2, config: &ProjectileConfig) -> Vec2 {
    Vec2::new(feet.x, feet.y - config.muzzle_height)
}

/// Point an arrow aims for on a target standing at `feet`.
#[must_use]
pub fn aim_point(feet: Vec2, config: &ProjectileConfig) -> Vec2 {
    Vec2::new(feet.x, feet.y - config.aim_height)
}
