//! Firing geometry: expand one discharge into per-projectile spawn descriptors.
//!
//! ## Spread
//!
//! A weapon with `N` pellets and spread angle `A` produces `N` descriptors.
//! Pellet `i` is rotated from the base direction by
//!
//! ```text
//! offset_i = (i - (N - 1) / 2) · A      (degrees, counter-clockwise)
//! ```
//!
//! so the fan is symmetric around the aim and neighbouring pellets are `A`
//! degrees apart.  Rotation preserves speed.
//!
//! Composition is pure: no pooling, no shared state, no randomness.  Ballistic
//! arcs are only *flagged* here; the simulator integrates gravity per tick.

use super::catalog::{ProjectileVisual, Splash, WeaponDefinition};
use crate::modifiers::CombatModifiers;
use bevy::prelude::*;

/// Which way the firer is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

/// Firing direction relative to the firer's facing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FireDirection {
    #[default]
    Forward,
    Up,
    Down,
    /// Free aim in world space.  Zero-length vectors fall back to `Forward`.
    Aimed(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aim {
    pub facing: Facing,
    pub direction: FireDirection,
}

impl Aim {
    pub fn new(facing: Facing, direction: FireDirection) -> Self {
        Self { facing, direction }
    }

    pub fn forward() -> Self {
        Self::default()
    }

    /// World-space unit vector for this aim.
    pub fn unit_vector(self) -> Vec2 {
        let forward = match self.facing {
            Facing::Right => Vec2::X,
            Facing::Left => Vec2::NEG_X,
        };
        match self.direction {
            FireDirection::Forward => forward,
            FireDirection::Up => Vec2::Y,
            FireDirection::Down => Vec2::NEG_Y,
            FireDirection::Aimed(v) => {
                let unit = v.normalize_or_zero();
                if unit == Vec2::ZERO || !unit.is_finite() {
                    forward
                } else {
                    unit
                }
            }
        }
    }
}

/// Initial state of one projectile produced by a discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnDescriptor {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub pierce: u32,
    pub splash: Option<Splash>,
    pub gravity: bool,
    pub homing: bool,
    pub visual: ProjectileVisual,
}

/// Angle offset (degrees) of pellet `index` in a fan of `count` pellets.
#[inline]
pub fn pellet_offset_degrees(index: u32, count: u32, spread_angle: f32) -> f32 {
    let count = count.max(1);
    (index as f32 - (count - 1) as f32 * 0.5) * spread_angle
}

/// Expand `weapon` into spawn descriptors appended to `out`.
///
/// `out` is not cleared, so callers can reuse one buffer across discharges.
pub fn compose_into(
    weapon: &WeaponDefinition,
    origin: Vec2,
    aim: Aim,
    modifiers: CombatModifiers,
    out: &mut Vec<SpawnDescriptor>,
) {
    let speed = weapon.speed * modifiers.effective_speed_multiplier();
    let base_velocity = aim.unit_vector() * speed;
    let damage = (weapon.damage + modifiers.damage_bonus).max(0.0);
    let splash = weapon.splash();
    let count = weapon.pellet_count();

    out.reserve(count as usize);
    for i in 0..count {
        let offset = pellet_offset_degrees(i, count, weapon.spread_angle);
        let velocity = if offset == 0.0 {
            base_velocity
        } else {
            Vec2::from_angle(offset.to_radians()).rotate(base_velocity)
        };
        out.push(SpawnDescriptor {
            position: origin,
            velocity,
            damage,
            pierce: weapon.pierce,
            splash,
            gravity: weapon.gravity,
            homing: weapon.homing,
            visual: weapon.visual,
        });
    }
}

/// Allocating convenience wrapper around [`compose_into`].
pub fn compose(
    weapon: &WeaponDefinition,
    origin: Vec2,
    aim: Aim,
    modifiers: CombatModifiers,
) -> Vec<SpawnDescriptor> {
    let mut out = Vec::with_capacity(weapon.pellet_count() as usize);
    compose_into(weapon, origin, aim, modifiers, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::WeaponCatalog;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn angle_deg(v: Vec2) -> f32 {
        v.y.atan2(v.x).to_degrees()
    }

    #[test]
    fn bonk_forward_is_a_single_straight_shot() {
        let catalog = WeaponCatalog::default();
        let shots = compose(
            catalog.lookup("bonk").unwrap(),
            Vec2::ZERO,
            Aim::forward(),
            CombatModifiers::default(),
        );
        assert_eq!(shots.len(), 1);
        let s = shots[0];
        assert!((s.velocity - Vec2::new(400.0, 0.0)).length() < 1e-4, "{:?}", s.velocity);
        assert_eq!(s.damage, 25.0);
        assert_eq!(s.pierce, 0);
        assert_eq!(s.splash, None);
        assert_eq!(s.position, Vec2::ZERO);
    }

    #[test]
    fn spread_fans_three_pellets_at_eighteen_degrees() {
        let catalog = WeaponCatalog::default();
        let shots = compose(
            catalog.lookup("spread").unwrap(),
            Vec2::new(10.0, 20.0),
            Aim::forward(),
            CombatModifiers::default(),
        );
        assert_eq!(shots.len(), 3);
        let expected = [-18.0, 0.0, 18.0];
        for (shot, want) in shots.iter().zip(expected) {
            assert!((angle_deg(shot.velocity) - want).abs() < 1e-3);
            assert!((shot.velocity.length() - 350.0).abs() < 1e-3);
            assert_eq!(shot.position, Vec2::new(10.0, 20.0));
        }
    }

    #[test]
    fn random_fans_are_symmetric_and_evenly_spaced() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let pellets = rng.gen_range(1..=9u32);
            let spread = rng.gen_range(0.0..30.0f32);
            let sum: f32 = (0..pellets)
                .map(|i| pellet_offset_degrees(i, pellets, spread))
                .sum();
            assert!(sum.abs() < 1e-3, "offsets must cancel, got {sum}");

            let weapon = WeaponDefinition {
                id: "fan".into(),
                damage: 1.0,
                speed: rng.gen_range(50.0..800.0),
                pellets: Some(pellets),
                spread_angle: spread,
                ..Default::default()
            };
            let shots = compose(&weapon, Vec2::ZERO, Aim::forward(), CombatModifiers::default());
            assert_eq!(shots.len(), pellets as usize);
            for pair in shots.windows(2) {
                let step = angle_deg(pair[1].velocity) - angle_deg(pair[0].velocity);
                assert!((step - spread).abs() < 1e-2, "step {step} vs spread {spread}");
            }
            for s in &shots {
                assert!((s.velocity.length() - weapon.speed).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn zero_pellets_clamps_to_one() {
        let weapon = WeaponDefinition {
            id: "broken".into(),
            damage: 5.0,
            speed: 100.0,
            pellets: Some(0),
            spread_angle: 45.0,
            ..Default::default()
        };
        let shots = compose(&weapon, Vec2::ZERO, Aim::forward(), CombatModifiers::default());
        assert_eq!(shots.len(), 1);
        assert!((shots[0].velocity - Vec2::new(100.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn damage_bonus_applies_and_clamps_at_zero() {
        let catalog = WeaponCatalog::default();
        let bonk = catalog.lookup("bonk").unwrap();
        let boosted = compose(bonk, Vec2::ZERO, Aim::forward(), CombatModifiers::with_damage_bonus(10.0));
        assert_eq!(boosted[0].damage, 35.0);
        let drained = compose(bonk, Vec2::ZERO, Aim::forward(), CombatModifiers::with_damage_bonus(-100.0));
        assert_eq!(drained[0].damage, 0.0);
    }

    #[test]
    fn speed_multiplier_scales_velocity() {
        let catalog = WeaponCatalog::default();
        let mods = CombatModifiers {
            damage_bonus: 0.0,
            speed_multiplier: 1.5,
        };
        let shots = compose(catalog.lookup("bonk").unwrap(), Vec2::ZERO, Aim::forward(), mods);
        assert!((shots[0].velocity.x - 600.0).abs() < 1e-3);
    }

    #[test]
    fn directions_follow_facing() {
        assert_eq!(Aim::new(Facing::Left, FireDirection::Forward).unit_vector(), Vec2::NEG_X);
        assert_eq!(Aim::new(Facing::Left, FireDirection::Up).unit_vector(), Vec2::Y);
        assert_eq!(Aim::new(Facing::Right, FireDirection::Down).unit_vector(), Vec2::NEG_Y);
        assert_eq!(
            Aim::new(Facing::Left, FireDirection::Aimed(Vec2::ZERO)).unit_vector(),
            Vec2::NEG_X
        );
        let diag = Aim::new(Facing::Right, FireDirection::Aimed(Vec2::new(3.0, 4.0))).unit_vector();
        assert!((diag - Vec2::new(0.6, 0.8)).length() < 1e-5);
    }

    #[test]
    fn special_flags_are_carried_through() {
        let catalog = WeaponCatalog::default();
        let mortar = compose(
            catalog.lookup("mortar").unwrap(),
            Vec2::ZERO,
            Aim::new(Facing::Right, FireDirection::Up),
            CombatModifiers::default(),
        );
        assert!(mortar[0].gravity);
        assert_eq!(mortar[0].splash.map(|s| s.radius), Some(80.0));
        assert_eq!(mortar[0].visual, ProjectileVisual::Shell);

        let rail = compose(catalog.lookup("rail").unwrap(), Vec2::ZERO, Aim::forward(), CombatModifiers::default());
        assert_eq!(rail[0].pierce, 3);
        assert!(!rail[0].gravity);

        let seeker = compose(catalog.lookup("seeker").unwrap(), Vec2::ZERO, Aim::forward(), CombatModifiers::default());
        assert!(seeker[0].homing);
    }

    #[test]
    fn compose_into_appends_without_clearing() {
        let catalog = WeaponCatalog::default();
        let mut buf = Vec::new();
        compose_into(catalog.lookup("bonk").unwrap(), Vec2::ZERO, Aim::forward(), CombatModifiers::default(), &mut buf);
        compose_into(catalog.lookup("spread").unwrap(), Vec2::ZERO, Aim::forward(), CombatModifiers::default(), &mut buf);
        assert_eq!(buf.len(), 4);
    }
}
