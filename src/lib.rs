//! Projectile and weapon combat engine
//!
//! Weapon definitions with unlock rules, fire-pattern composition, pooled
//! projectiles with pierce and splash, and a Bevy plugin that drives them
//! and mirrors each pooled projectile into a Rapier sensor body.

pub mod combat;
pub mod config;
pub mod constants;
pub mod error;
pub mod modifiers;
pub mod projectile;
pub mod weapon;

pub use combat::CombatPlugin;
