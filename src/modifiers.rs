//! Transient combat multipliers supplied by active power-ups.
//!
//! The power-up system owns effect timing; it writes the aggregate into the
//! [`CombatModifiers`] resource and the combat plugin reads it when a fire
//! request is processed.  Projectiles already in flight are unaffected by
//! later changes.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CombatModifiers {
    /// Flat damage added to every projectile of a discharge.  May be negative.
    pub damage_bonus: f32,
    /// Scales projectile travel speed.  Negative values are treated as zero.
    pub speed_multiplier: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            damage_bonus: 0.0,
            speed_multiplier: 1.0,
        }
    }
}

impl CombatModifiers {
    pub fn with_damage_bonus(damage_bonus: f32) -> Self {
        Self {
            damage_bonus,
            ..Default::default()
        }
    }

    /// Combine two modifier sets: bonuses add, multipliers multiply.
    pub fn stack(self, other: CombatModifiers) -> Self {
        Self {
            damage_bonus: self.damage_bonus + other.damage_bonus,
            speed_multiplier: self.speed_multiplier * other.speed_multiplier,
        }
    }

    #[inline]
    pub(crate) fn effective_speed_multiplier(self) -> f32 {
        if self.speed_multiplier.is_finite() {
            self.speed_multiplier.max(0.0)
        } else {
            1.0
        }
    }
}
