//! Projectile lifetime: pooling, simulation, and physics-body mirroring.
//!
//! - [`pool`]: slot arena of reusable visual handles
//! - [`simulator`]: live set, per-tick integration, hits, retirement
//! - [`bodies`]: one Rapier sensor entity per pool slot

pub mod bodies;
pub mod pool;
pub mod simulator;

use bevy::prelude::*;

pub use bodies::{sync_projectile_bodies_system, ProjectileBodies, ProjectileBody};
pub use pool::{PoolStats, PooledVisual, ProjectilePool, VisualHandle};
pub use simulator::{
    HitOutcome, Projectile, ProjectileId, ProjectileSimulator, RetireReason, Retirement,
    SimulatorSettings,
};

/// Axis-aligned playable rectangle.  Points on the edge are inside.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayfieldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl PlayfieldBounds {
    pub fn centered(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

impl Default for PlayfieldBounds {
    fn default() -> Self {
        crate::config::CombatConfig::default().bounds_around(Vec2::ZERO)
    }
}
