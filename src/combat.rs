//! Combat plugin: wires the weapon catalog and projectile simulator into Bevy.
//!
//! ## Message flow
//!
//! | Message              | Direction | Meaning                                        |
//! |----------------------|-----------|------------------------------------------------|
//! | [`FireRequest`]      | in        | discharge a weapon (modifiers read on arrival) |
//! | [`ProjectileHit`]    | in        | collision resolver saw a projectile touch      |
//! | [`RetireProjectile`] | in        | explicit external retirement                   |
//! | [`ProjectileImpact`] | out       | damage / splash facts of one hit               |
//! | [`ProjectileRetired`]| out       | every retirement, whatever the reason          |
//!
//! ## Update order
//!
//! `follow_camera_bounds` → `fire_requests` → `projectile_hits` →
//! `retire_requests` → `projectile_tick` → `sync_projectile_bodies`, chained
//! inside [`CombatSystems`].  A resolver that reads
//! [`ProjectileSimulator::active_projectiles`] should run after
//! `CombatSystems`; its hit messages are applied at the start of the next
//! frame's pass.
//!
//! Cooldown gating and currency spending are left to the firing controller.

use crate::config::{load_combat_config, CombatConfig};
use crate::modifiers::CombatModifiers;
use crate::projectile::{
    sync_projectile_bodies_system, HitOutcome, PlayfieldBounds, ProjectileBodies, ProjectileId,
    ProjectileSimulator, Retirement, SimulatorSettings,
};
use crate::weapon::{load_weapon_catalog, Aim, PlayerProgression, WeaponCatalog};
use bevy::prelude::*;

// ── Messages ──────────────────────────────────────────────────────────────────

/// Ask for one discharge of `weapon_id`.  Unknown ids are ignored.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct FireRequest {
    pub weapon_id: String,
    pub origin: Vec2,
    pub aim: Aim,
}

/// A projectile touched a target at `point`.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    pub projectile: ProjectileId,
    pub point: Vec2,
}

/// Retire a projectile without a hit (e.g. it struck terrain).
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetireProjectile {
    pub projectile: ProjectileId,
}

/// Damage facts of one processed hit.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileImpact(pub HitOutcome);

/// A projectile left the live set.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRetired(pub Retirement);

/// All per-frame combat systems.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombatSystems;

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .init_resource::<WeaponCatalog>()
            .init_resource::<PlayerProgression>()
            .init_resource::<CombatModifiers>()
            .init_resource::<PlayfieldBounds>()
            .init_resource::<ProjectileSimulator>()
            .init_resource::<ProjectileBodies>()
            .add_message::<FireRequest>()
            .add_message::<ProjectileHit>()
            .add_message::<RetireProjectile>()
            .add_message::<ProjectileImpact>()
            .add_message::<ProjectileRetired>()
            .add_systems(
                Startup,
                (
                    load_combat_config,
                    load_weapon_catalog,
                    setup_projectile_simulator,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    follow_camera_bounds_system,
                    fire_request_system,
                    projectile_hit_system,
                    retire_request_system,
                    projectile_tick_system,
                    sync_projectile_bodies_system,
                )
                    .chain()
                    .in_set(CombatSystems),
            )
            .add_systems(Last, shutdown_on_exit_system);
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Rebuild the simulator from the loaded config and warm its pool.
pub fn setup_projectile_simulator(
    config: Res<CombatConfig>,
    mut simulator: ResMut<ProjectileSimulator>,
    mut bounds: ResMut<PlayfieldBounds>,
) {
    *simulator = ProjectileSimulator::new(SimulatorSettings {
        pool_capacity: config.pool_capacity,
        gravity: config.projectile_gravity,
    });
    simulator.prewarm(config.pool_capacity / 4);
    *bounds = config.bounds_around(Vec2::ZERO);
    info!(
        "Projectile pool ready: capacity {}, {} prewarmed",
        config.pool_capacity,
        simulator.pool().free_len()
    );
}

// ── Update ────────────────────────────────────────────────────────────────────

/// Recentre the playfield on the 2D camera so bounds scroll with the level.
pub fn follow_camera_bounds_system(
    config: Res<CombatConfig>,
    q_camera: Query<&Transform, With<Camera2d>>,
    mut bounds: ResMut<PlayfieldBounds>,
) {
    if !config.bounds_follow_camera {
        return;
    }
    let Some(camera) = q_camera.iter().next() else {
        return;
    };
    let next = config.bounds_around(camera.translation.truncate());
    if *bounds != next {
        *bounds = next;
    }
}

/// Apply queued fire requests with the modifiers active right now.
pub fn fire_request_system(
    mut requests: MessageReader<FireRequest>,
    catalog: Res<WeaponCatalog>,
    modifiers: Res<CombatModifiers>,
    mut simulator: ResMut<ProjectileSimulator>,
) {
    for request in requests.read() {
        simulator.fire(
            &catalog,
            &request.weapon_id,
            request.origin,
            request.aim,
            *modifiers,
        );
    }
}

/// Turn resolver hit reports into impacts (and retirements when pierce runs out).
pub fn projectile_hit_system(
    mut hits: MessageReader<ProjectileHit>,
    mut simulator: ResMut<ProjectileSimulator>,
    mut impacts: MessageWriter<ProjectileImpact>,
    mut retired: MessageWriter<ProjectileRetired>,
) {
    for hit in hits.read() {
        // None: already retired earlier this frame (e.g. two targets on one tick).
        let Some(outcome) = simulator.register_hit(hit.projectile, hit.point) else {
            continue;
        };
        impacts.write(ProjectileImpact(outcome));
        if let Some(retirement) = outcome.retirement() {
            retired.write(ProjectileRetired(retirement));
        }
    }
}

pub fn retire_request_system(
    mut requests: MessageReader<RetireProjectile>,
    mut simulator: ResMut<ProjectileSimulator>,
    mut retired: MessageWriter<ProjectileRetired>,
) {
    for request in requests.read() {
        if let Some(retirement) = simulator.retire(request.projectile) {
            retired.write(ProjectileRetired(retirement));
        }
    }
}

/// Integrate all projectiles by the frame delta and announce bounds exits.
pub fn projectile_tick_system(
    time: Res<Time>,
    bounds: Res<PlayfieldBounds>,
    mut simulator: ResMut<ProjectileSimulator>,
    mut retired: MessageWriter<ProjectileRetired>,
) {
    if simulator.is_empty() {
        return;
    }
    for retirement in simulator.tick(time.delta_secs(), *bounds) {
        retired.write(ProjectileRetired(*retirement));
    }
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

/// Retire everything and drop pooled handles once the app is exiting.
pub fn shutdown_on_exit_system(
    mut exits: MessageReader<AppExit>,
    mut simulator: ResMut<ProjectileSimulator>,
    mut retired: MessageWriter<ProjectileRetired>,
) {
    if exits.read().next().is_none() || simulator.is_shut_down() {
        return;
    }
    for retirement in simulator.shutdown() {
        retired.write(ProjectileRetired(*retirement));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(CombatPlugin);
        app
    }

    #[test]
    fn startup_builds_simulator_from_config() {
        let mut app = app();
        app.update();
        let config = app.world().resource::<CombatConfig>().clone();
        let sim = app.world().resource::<ProjectileSimulator>();
        assert_eq!(sim.pool().capacity(), config.pool_capacity);
        assert_eq!(sim.pool().free_len(), config.pool_capacity / 4);
        assert!(!sim.is_shut_down());
    }

    #[test]
    fn retire_request_announces_once() {
        let mut app = app();
        app.update();
        app.world_mut().write_message(FireRequest {
            weapon_id: "bonk".into(),
            origin: Vec2::ZERO,
            aim: Aim::forward(),
        });
        app.update();
        let id = app.world().resource::<ProjectileSimulator>().active_projectiles()[0].id;

        app.world_mut().write_message(RetireProjectile { projectile: id });
        app.world_mut().write_message(RetireProjectile { projectile: id });
        app.update();

        let mut messages = app.world_mut().resource_mut::<Messages<ProjectileRetired>>();
        let retired: Vec<_> = messages.drain().collect();
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].0.reason, crate::projectile::RetireReason::External);
    }

    #[test]
    fn app_exit_shuts_the_simulator_down() {
        let mut app = app();
        app.update();
        app.world_mut().write_message(FireRequest {
            weapon_id: "spread".into(),
            origin: Vec2::ZERO,
            aim: Aim::forward(),
        });
        app.update();
        app.world_mut().write_message(AppExit::Success);
        app.update();
        let sim = app.world().resource::<ProjectileSimulator>();
        assert!(sim.is_shut_down());
        assert!(sim.is_empty());
    }
}
