//! Live projectile set: firing, per-tick integration, hits, and retirement.
//!
//! ## Lifecycle
//!
//! ```text
//! Active ──(left bounds)──────► OutOfBounds ─┐
//!        ──(last pierce hit)──► PierceExhausted ─┤
//!        ──(retire call)──────► External ─┼──► Retired (handle released)
//!        ──(shutdown)─────────► Shutdown ─┘
//! ```
//!
//! Retired projectiles are removed from the live set immediately, so being in
//! [`ProjectileSimulator::active_projectiles`] *is* the active flag.  Ids are
//! never reused; pool handles are.
//!
//! ## Hits
//!
//! The external collision resolver calls [`ProjectileSimulator::register_hit`]
//! once per contact.  The returned [`HitOutcome`] always carries the hit's
//! damage and splash; the pierce budget is decremented *after* the hit is
//! reported, and the projectile retires when the budget reaches zero.  A
//! projectile with no pierce retires on its first hit; one at
//! [`PIERCE_UNLIMITED`] is never decremented.

use super::pool::{PoolStats, ProjectilePool, VisualHandle};
use super::PlayfieldBounds;
use crate::constants::PIERCE_UNLIMITED;
use crate::error::{CombatError, CombatResult};
use crate::modifiers::CombatModifiers;
use crate::weapon::{compose_into, Aim, SpawnDescriptor, Splash, WeaponCatalog};
use bevy::prelude::*;

/// Unique, never-reused projectile identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetireReason {
    OutOfBounds,
    PierceExhausted,
    External,
    Shutdown,
}

/// Record of one projectile leaving the live set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retirement {
    pub id: ProjectileId,
    pub handle: VisualHandle,
    pub weapon: usize,
    pub position: Vec2,
    pub reason: RetireReason,
}

/// Damage facts of one hit, for the collision resolver to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub id: ProjectileId,
    pub handle: VisualHandle,
    pub weapon: usize,
    pub damage: f32,
    /// Area damage centred on the hit point, if the weapon splashes.
    pub splash: Option<Splash>,
    pub point: Vec2,
    /// Projectile position when the hit was reported.
    pub position: Vec2,
    /// Pierce budget left after this hit.
    pub remaining_pierce: u32,
    pub retired: bool,
}

impl HitOutcome {
    /// The retirement this hit caused, if pierce ran out.
    pub fn retirement(&self) -> Option<Retirement> {
        self.retired.then_some(Retirement {
            id: self.id,
            handle: self.handle,
            weapon: self.weapon,
            position: self.position,
            reason: RetireReason::PierceExhausted,
        })
    }
}

/// One in-flight projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub handle: VisualHandle,
    /// Index into the [`WeaponCatalog`] that fired it.
    pub weapon: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub pierce: u32,
    pub splash: Option<Splash>,
    pub gravity: bool,
    pub homing: bool,
}

/// Tunables the simulator needs from [`crate::config::CombatConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorSettings {
    pub pool_capacity: usize,
    pub gravity: f32,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            pool_capacity: crate::constants::POOL_CAPACITY,
            gravity: crate::constants::PROJECTILE_GRAVITY,
        }
    }
}

#[derive(Resource, Debug)]
pub struct ProjectileSimulator {
    live: Vec<Projectile>,
    pool: ProjectilePool,
    gravity: f32,
    next_id: u64,
    /// Reused between discharges so firing does not allocate.
    scratch: Vec<SpawnDescriptor>,
    /// Retirements produced by the last `tick`.
    retired: Vec<Retirement>,
}

impl Default for ProjectileSimulator {
    fn default() -> Self {
        Self::new(SimulatorSettings::default())
    }
}

impl ProjectileSimulator {
    pub fn new(settings: SimulatorSettings) -> Self {
        Self {
            live: Vec::with_capacity(settings.pool_capacity),
            pool: ProjectilePool::new(settings.pool_capacity),
            gravity: settings.gravity,
            next_id: 0,
            scratch: Vec::new(),
            retired: Vec::with_capacity(settings.pool_capacity),
        }
    }

    /// Discharge `weapon_id` and return how many projectiles were spawned.
    ///
    /// Unknown weapons and a shut-down pool are logged and spawn nothing.
    pub fn fire(
        &mut self,
        catalog: &WeaponCatalog,
        weapon_id: &str,
        origin: Vec2,
        aim: Aim,
        modifiers: CombatModifiers,
    ) -> usize {
        match self.try_fire(catalog, weapon_id, origin, aim, modifiers) {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!("Fire ignored: {e}");
                0
            }
        }
    }

    /// Fallible form of [`ProjectileSimulator::fire`].
    ///
    /// If the pool closes part-way through a discharge the projectiles
    /// already spawned stay live and the count so far is returned.
    pub fn try_fire(
        &mut self,
        catalog: &WeaponCatalog,
        weapon_id: &str,
        origin: Vec2,
        aim: Aim,
        modifiers: CombatModifiers,
    ) -> CombatResult<usize> {
        let Some(weapon) = catalog.index_of(weapon_id) else {
            return Err(CombatError::UnknownWeapon {
                id: weapon_id.to_string(),
            });
        };
        if self.pool.is_closed() {
            return Err(CombatError::PoolClosed);
        }
        let Some(definition) = catalog.get(weapon) else {
            return Err(CombatError::UnknownWeapon {
                id: weapon_id.to_string(),
            });
        };

        self.scratch.clear();
        compose_into(definition, origin, aim, modifiers, &mut self.scratch);

        let mut spawned = 0;
        for descriptor in &self.scratch {
            let Some(handle) = self.pool.acquire(descriptor.visual) else {
                break;
            };
            if let Some(slot) = self.pool.get_mut(handle) {
                slot.position = descriptor.position;
                slot.velocity = descriptor.velocity;
            }
            let id = ProjectileId(self.next_id);
            self.next_id += 1;
            self.live.push(Projectile {
                id,
                handle,
                weapon,
                position: descriptor.position,
                velocity: descriptor.velocity,
                damage: descriptor.damage,
                pierce: descriptor.pierce,
                splash: descriptor.splash,
                gravity: descriptor.gravity,
                homing: descriptor.homing,
            });
            spawned += 1;
        }
        Ok(spawned)
    }

    /// Advance every projectile by `dt` seconds and retire those that left
    /// `bounds`.  Returns the retirements of this tick.
    ///
    /// A projectile exactly on the bounds edge stays active.
    pub fn tick(&mut self, dt: f32, bounds: PlayfieldBounds) -> &[Retirement] {
        self.retired.clear();
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let gravity = self.gravity;
        let pool = &mut self.pool;
        let retired = &mut self.retired;

        self.live.retain_mut(|p| {
            if p.gravity {
                p.velocity.y -= gravity * dt;
            }
            p.position += p.velocity * dt;

            if bounds.contains(p.position) {
                if let Some(slot) = pool.get_mut(p.handle) {
                    slot.position = p.position;
                    slot.velocity = p.velocity;
                }
                true
            } else {
                pool.release(p.handle);
                retired.push(Retirement {
                    id: p.id,
                    handle: p.handle,
                    weapon: p.weapon,
                    position: p.position,
                    reason: RetireReason::OutOfBounds,
                });
                false
            }
        });
        &self.retired
    }

    /// Active projectiles in spawn order.
    #[inline]
    pub fn active_projectiles(&self) -> &[Projectile] {
        &self.live
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.position_of(id).map(|i| &self.live[i])
    }

    /// Active projectile currently holding `handle`.
    pub fn by_handle(&self, handle: VisualHandle) -> Option<&Projectile> {
        self.live.iter().find(|p| p.handle == handle)
    }

    #[inline]
    pub fn is_active(&self, id: ProjectileId) -> bool {
        self.position_of(id).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    #[inline]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Pre-create pooled handles so the first discharges reuse slots.
    pub fn prewarm(&mut self, count: usize) {
        self.pool
            .prewarm(crate::weapon::ProjectileVisual::default(), count);
    }

    /// Report one collision of `id` at `point`.
    ///
    /// Returns `None` when `id` is not active (already retired or unknown).
    pub fn register_hit(&mut self, id: ProjectileId, point: Vec2) -> Option<HitOutcome> {
        let index = self.position_of(id)?;
        let projectile = &mut self.live[index];

        let exhausted = if projectile.pierce >= PIERCE_UNLIMITED {
            false
        } else if projectile.pierce == 0 {
            true
        } else {
            projectile.pierce -= 1;
            projectile.pierce == 0
        };

        let outcome = HitOutcome {
            id,
            handle: projectile.handle,
            weapon: projectile.weapon,
            damage: projectile.damage,
            splash: projectile.splash,
            point,
            position: projectile.position,
            remaining_pierce: projectile.pierce,
            retired: exhausted,
        };
        if exhausted {
            self.retire_at(index, RetireReason::PierceExhausted);
        }
        Some(outcome)
    }

    /// Retire `id` now.  Calling it for an already retired projectile is a
    /// no-op returning `None`.
    pub fn retire(&mut self, id: ProjectileId) -> Option<Retirement> {
        let index = self.position_of(id)?;
        Some(self.retire_at(index, RetireReason::External))
    }

    /// Retire every projectile and destroy all pooled handles.
    ///
    /// Later fires are refused.  Returns one [`RetireReason::Shutdown`]
    /// retirement per projectile that was still live, in spawn order.
    pub fn shutdown(&mut self) -> &[Retirement] {
        self.retired.clear();
        for p in self.live.drain(..) {
            self.pool.release(p.handle);
            self.retired.push(Retirement {
                id: p.id,
                handle: p.handle,
                weapon: p.weapon,
                position: p.position,
                reason: RetireReason::Shutdown,
            });
        }
        self.pool.shutdown();
        self.scratch.clear();
        info!(
            "Projectile simulator shut down; retired {} projectiles",
            self.retired.len()
        );
        &self.retired
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.pool.is_closed()
    }

    fn position_of(&self, id: ProjectileId) -> Option<usize> {
        // Ids are assigned in increasing order and the live set keeps spawn
        // order, so it is sorted by id.
        self.live.binary_search_by_key(&id, |p| p.id).ok()
    }

    fn retire_at(&mut self, index: usize, reason: RetireReason) -> Retirement {
        let p = self.live.remove(index);
        self.pool.release(p.handle);
        Retirement {
            id: p.id,
            handle: p.handle,
            weapon: p.weapon,
            position: p.position,
            reason,
        }
    }
}
