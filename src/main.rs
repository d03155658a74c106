use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;
use rand::Rng;

use volley::combat::{CombatSystems, FireRequest, ProjectileHit, ProjectileImpact};
use volley::config::CombatConfig;
use volley::projectile::{PlayfieldBounds, ProjectileBody, ProjectileSimulator};
use volley::weapon::{
    Aim, Currency, Facing, FireDirection, PlayerProgression, ProjectileVisual, WeaponCatalog,
    Wallet,
};
use volley::CombatPlugin;

mod alloc_profile;

const DUMMY_COUNT: usize = 6;
const DUMMY_RADIUS: f32 = 22.0;
const DUMMY_HEALTH: f32 = 120.0;
const GUNNER_POSITION: Vec2 = Vec2::new(-520.0, -220.0);

// ── Demo state ────────────────────────────────────────────────────────────────

#[derive(Component)]
struct Gunner;

#[derive(Component)]
struct Dummy {
    health: f32,
}

/// Selected weapon and the time left before it may fire again.
#[derive(Resource, Default)]
struct Loadout {
    selected: usize,
    cooldown: f32,
    aim: Aim,
}

// ── Startup ───────────────────────────────────────────────────────────────────

fn setup_scene(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((Gunner, Transform::from_translation(GUNNER_POSITION.extend(0.0))));
    for _ in 0..DUMMY_COUNT {
        spawn_dummy(&mut commands);
    }
}

/// Projectiles fly on their own integration; Rapier only detects contacts.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn spawn_dummy(commands: &mut Commands) {
    let mut rng = rand::thread_rng();
    let position = Vec2::new(rng.gen_range(-200.0..560.0), rng.gen_range(-280.0..280.0));
    commands.spawn((
        Dummy {
            health: DUMMY_HEALTH,
        },
        Transform::from_translation(position.extend(0.0)),
        RigidBody::Fixed,
        Collider::ball(DUMMY_RADIUS),
        CollisionGroups::new(Group::GROUP_5, Group::GROUP_3),
        ActiveCollisionTypes::KINEMATIC_STATIC,
        ActiveEvents::COLLISION_EVENTS,
    ));
}

// ── Firing controller ─────────────────────────────────────────────────────────

/// Arrow keys aim, Tab cycles unlocked weapons, Space fires.
///
/// Cooldown and currency are gated here; the combat plugin only sees
/// requests that passed both.
#[allow(clippy::too_many_arguments)]
fn gunner_fire_system(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    catalog: Res<WeaponCatalog>,
    progression: Res<PlayerProgression>,
    q_gunner: Query<&Transform, With<Gunner>>,
    mut loadout: ResMut<Loadout>,
    mut wallet: ResMut<Wallet>,
    mut fire: MessageWriter<FireRequest>,
) {
    loadout.cooldown = (loadout.cooldown - time.delta_secs()).max(0.0);

    if keys.just_pressed(KeyCode::ArrowLeft) {
        loadout.aim.facing = Facing::Left;
    } else if keys.just_pressed(KeyCode::ArrowRight) {
        loadout.aim.facing = Facing::Right;
    }
    loadout.aim.direction = if keys.pressed(KeyCode::ArrowUp) {
        FireDirection::Up
    } else if keys.pressed(KeyCode::ArrowDown) {
        FireDirection::Down
    } else {
        FireDirection::Forward
    };

    let unlocked = catalog.list_unlocked(&progression);
    if unlocked.is_empty() {
        return;
    }
    if keys.just_pressed(KeyCode::Tab) {
        loadout.selected = (loadout.selected + 1) % unlocked.len();
        info!("Selected {}", unlocked[loadout.selected].name);
    }
    let weapon = unlocked[loadout.selected % unlocked.len()];

    if !keys.pressed(KeyCode::Space) || loadout.cooldown > 0.0 {
        return;
    }
    let Ok(transform) = q_gunner.single() else {
        return;
    };
    if !wallet.try_spend(weapon) {
        if keys.just_pressed(KeyCode::Space) {
            warn!("Cannot afford {}", weapon.name);
        }
        return;
    }
    loadout.cooldown = weapon.cooldown;
    fire.write(FireRequest {
        weapon_id: weapon.id.clone(),
        origin: transform.translation.truncate(),
        aim: loadout.aim,
    });
}

// ── Collision resolver ────────────────────────────────────────────────────────

/// Report projectile sensor contacts with dummies to the combat plugin.
fn projectile_contact_system(
    mut collision_events: MessageReader<CollisionEvent>,
    q_bodies: Query<&ProjectileBody>,
    q_dummies: Query<(), With<Dummy>>,
    q_transforms: Query<&Transform>,
    simulator: Res<ProjectileSimulator>,
    mut hits: MessageWriter<ProjectileHit>,
) {
    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };

        let (body_entity, dummy_entity) = if q_bodies.contains(e1) && q_dummies.contains(e2) {
            (e1, e2)
        } else if q_bodies.contains(e2) && q_dummies.contains(e1) {
            (e2, e1)
        } else {
            continue;
        };
        let Ok(body) = q_bodies.get(body_entity) else {
            continue;
        };
        // A stale handle means the slot was recycled since the contact began.
        let Some(projectile) = simulator.by_handle(body.handle) else {
            continue;
        };
        let point = q_transforms
            .get(dummy_entity)
            .map(|t| t.translation.truncate())
            .unwrap_or(projectile.position);
        hits.write(ProjectileHit {
            projectile: projectile.id,
            point,
        });
    }
}

/// Apply direct and splash damage, then replace destroyed dummies.
fn apply_impacts_system(
    mut commands: Commands,
    mut impacts: MessageReader<ProjectileImpact>,
    mut q_dummies: Query<(Entity, &Transform, &mut Dummy)>,
    mut wallet: ResMut<Wallet>,
) {
    for ProjectileImpact(outcome) in impacts.read() {
        for (_, transform, mut dummy) in q_dummies.iter_mut() {
            let distance = transform.translation.truncate().distance(outcome.point);
            if distance <= 1.0 {
                dummy.health -= outcome.damage;
            } else if let Some(splash) = outcome.splash {
                if distance <= splash.radius {
                    dummy.health -= splash.damage;
                }
            }
        }
    }

    for (entity, _, dummy) in q_dummies.iter() {
        if dummy.health <= 0.0 {
            commands.entity(entity).despawn();
            spawn_dummy(&mut commands);
            wallet.deposit(Currency::Coins, 5);
            wallet.deposit(Currency::Energy, 1);
        }
    }
}

// ── Drawing ───────────────────────────────────────────────────────────────────

fn visual_color(visual: ProjectileVisual) -> Color {
    match visual {
        ProjectileVisual::Pellet => Color::srgb(1.0, 0.9, 0.4),
        ProjectileVisual::Bolt => Color::srgb(0.4, 0.8, 1.0),
        ProjectileVisual::Slug => Color::srgb(0.9, 0.9, 0.9),
        ProjectileVisual::Shell => Color::srgb(1.0, 0.5, 0.2),
        ProjectileVisual::Orb => Color::srgb(0.8, 0.4, 1.0),
    }
}

fn draw_system(
    mut gizmos: Gizmos,
    simulator: Res<ProjectileSimulator>,
    config: Res<CombatConfig>,
    bounds: Res<PlayfieldBounds>,
    q_gunner: Query<&Transform, With<Gunner>>,
    q_dummies: Query<(&Transform, &Dummy)>,
) {
    let centre = (bounds.min + bounds.max) * 0.5;
    gizmos.rect_2d(
        Isometry2d::from_translation(centre),
        bounds.max - bounds.min,
        Color::srgb(0.25, 0.25, 0.25),
    );

    for transform in q_gunner.iter() {
        gizmos.circle_2d(
            Isometry2d::from_translation(transform.translation.truncate()),
            12.0,
            Color::WHITE,
        );
    }

    for (transform, dummy) in q_dummies.iter() {
        let health = (dummy.health / DUMMY_HEALTH).clamp(0.0, 1.0);
        gizmos.circle_2d(
            Isometry2d::from_translation(transform.translation.truncate()),
            DUMMY_RADIUS,
            Color::srgb(1.0 - health, health, 0.2),
        );
    }

    let pool = simulator.pool();
    for projectile in simulator.active_projectiles() {
        let color = pool
            .get(projectile.handle)
            .map(|v| visual_color(v.kind))
            .unwrap_or(Color::WHITE);
        gizmos.circle_2d(
            Isometry2d::from_translation(projectile.position),
            config.projectile_collider_radius,
            color,
        );
    }
}

// ── Housekeeping ──────────────────────────────────────────────────────────────

fn exit_on_escape_system(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}

/// Log heap traffic every two seconds while `VOLLEY_ALLOC_PROFILE` is set.
fn alloc_report_system(
    time: Res<Time>,
    simulator: Res<ProjectileSimulator>,
    mut elapsed: Local<f32>,
) {
    *elapsed += time.delta_secs();
    if *elapsed < 2.0 {
        return;
    }
    *elapsed = 0.0;
    let traffic = alloc_profile::take_traffic();
    info!(
        "[ALLOC] {} live projectiles | allocs {} reallocs {} frees {} | {} bytes requested",
        simulator.len(),
        traffic.allocs,
        traffic.reallocs,
        traffic.frees,
        traffic.bytes_requested
    );
}

fn main() {
    alloc_profile::init_from_env();

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Volley".into(),
            resolution: WindowResolution::new(1280, 720),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::BLACK))
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
    .add_plugins(CombatPlugin)
    // Enough progression to unlock everything except mission-locked weapons
    // the player has not earned.
    .insert_resource(PlayerProgression::at_level(7).with_mission("siege_of_valor"))
    .insert_resource(
        Wallet::default()
            .with_balance(Currency::Coins, 200)
            .with_balance(Currency::Gems, 20)
            .with_balance(Currency::Energy, 30),
    )
    .init_resource::<Loadout>()
    .add_systems(Startup, (setup_scene, setup_physics_config))
    .add_systems(
        Update,
        (
            gunner_fire_system.before(CombatSystems),
            (projectile_contact_system, apply_impacts_system)
                .chain()
                .after(CombatSystems),
            draw_system.after(CombatSystems),
            exit_on_escape_system,
        ),
    );

    if alloc_profile::is_enabled() {
        info!("Allocation profiling enabled");
        app.add_systems(Last, alloc_report_system);
    }

    app.run();
}
