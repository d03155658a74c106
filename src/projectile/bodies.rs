//! One long-lived Rapier sensor entity per projectile pool slot.
//!
//! Bodies are spawned the first time their slot exists and despawned only
//! when the pool destroys the slot (over capacity, or at shutdown).  A
//! retired slot keeps its entity: it is hidden and its collider disabled, then
//! shown again when the slot is reacquired.  This keeps entity churn at zero
//! during steady-state firing.
//!
//! The simulator owns projectile motion, so bodies are position-based
//! kinematic: the sync writes `Transform` and Rapier only follows it.
//!
//! Collision resolvers map a body back to its projectile with
//! `simulator.by_handle(body.handle)`.

use super::{ProjectileSimulator, VisualHandle};
use crate::config::CombatConfig;
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

/// Marker + back-reference on a projectile body entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct ProjectileBody {
    /// Pool slot this entity mirrors.
    pub slot: usize,
    /// Slot handle as of the last sync; stale once the slot is recycled.
    pub handle: VisualHandle,
    /// Whether the collider is currently enabled.
    pub enabled: bool,
}

/// Slot index → body entity.
#[derive(Resource, Debug, Default)]
pub struct ProjectileBodies {
    entities: Vec<Option<Entity>>,
}

impl ProjectileBodies {
    #[inline]
    pub fn entity(&self, slot: usize) -> Option<Entity> {
        self.entities.get(slot).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entities.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn visibility_for(visible: bool) -> Visibility {
    if visible {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}

/// Mirror the pool into body entities: spawn, update, hide, or despawn.
pub fn sync_projectile_bodies_system(
    mut commands: Commands,
    simulator: Res<ProjectileSimulator>,
    config: Res<CombatConfig>,
    mut bodies: ResMut<ProjectileBodies>,
    mut q_bodies: Query<(&mut ProjectileBody, &mut Transform, &mut Visibility)>,
) {
    let pool = simulator.pool();
    if bodies.entities.len() < pool.slot_count() {
        bodies.entities.resize(pool.slot_count(), None);
    }

    for (index, slot) in pool.slots() {
        let existing = bodies.entities[index];
        match (slot, existing) {
            (None, None) => {}
            (None, Some(entity)) => {
                commands.entity(entity).despawn();
                bodies.entities[index] = None;
            }
            (Some(visual), None) => {
                let Some(handle) = pool.handle_at(index) else {
                    continue;
                };
                let mut entity = commands.spawn((
                    ProjectileBody {
                        slot: index,
                        handle,
                        enabled: visual.active,
                    },
                    Transform::from_translation(visual.position.extend(0.0)),
                    visibility_for(visual.visible),
                    RigidBody::KinematicPositionBased,
                    Collider::ball(config.projectile_collider_radius),
                    // Sensor: report contacts to the collision resolver without
                    // pushing whatever the projectile touches.
                    Sensor,
                    CollisionGroups::new(Group::GROUP_3, Group::GROUP_5),
                    ActiveCollisionTypes::DYNAMIC_KINEMATIC
                        | ActiveCollisionTypes::KINEMATIC_STATIC,
                    ActiveEvents::COLLISION_EVENTS,
                ));
                if !visual.active {
                    entity.insert(ColliderDisabled);
                }
                bodies.entities[index] = Some(entity.id());
            }
            (Some(visual), Some(entity)) => {
                let Ok((mut body, mut transform, mut visibility)) = q_bodies.get_mut(entity)
                else {
                    // Spawned this frame; commands have not been applied yet.
                    continue;
                };
                if let Some(handle) = pool.handle_at(index) {
                    body.handle = handle;
                }
                transform.translation = visual.position.extend(transform.translation.z);
                visibility.set_if_neq(visibility_for(visual.visible));

                if body.enabled != visual.active {
                    body.enabled = visual.active;
                    if visual.active {
                        commands.entity(entity).remove::<ColliderDisabled>();
                    } else {
                        commands.entity(entity).insert(ColliderDisabled);
                    }
                }
            }
        }
    }
}
