//! Centralised combat constants.
//!
//! These are the authoritative defaults behind [`crate::config::CombatConfig`].
//! Values in `assets/combat.toml` override them at startup without a rebuild.

// ── Playfield ─────────────────────────────────────────────────────────────────

/// Width of the playable rectangle (world units), centred on the camera.
///
/// Matches the default window width so a projectile is retired as soon as it
/// leaves the visible area plus [`BOUNDS_MARGIN`].
pub const PLAYFIELD_WIDTH: f32 = 1280.0;

/// Height of the playable rectangle (world units).
pub const PLAYFIELD_HEIGHT: f32 = 720.0;

/// Extra space kept around the visible area before a projectile counts as
/// out of bounds.  Keeps large sprites from popping out while still visible.
pub const BOUNDS_MARGIN: f32 = 32.0;

// ── Projectile pool ───────────────────────────────────────────────────────────

/// Maximum number of retired handles kept on the free list.
///
/// A steady 60 Hz spread-weapon barrage keeps ~150 projectiles alive; 256
/// leaves headroom for bursts.  Handles released while the free list is full
/// are destroyed outright.
pub const POOL_CAPACITY: usize = 256;

// ── Ballistics ────────────────────────────────────────────────────────────────

/// Downward acceleration (units/s²) applied to gravity-flagged projectiles.
pub const PROJECTILE_GRAVITY: f32 = 900.0;

/// Collider radius of every projectile body.
pub const PROJECTILE_COLLIDER_RADIUS: f32 = 4.0;

/// Pierce budget treated as "passes through everything".
///
/// Projectiles at or above this value are never decremented on hit.
pub const PIERCE_UNLIMITED: u32 = 999;

// ── Data files ────────────────────────────────────────────────────────────────

/// Runtime combat tuning file.
pub const COMBAT_CONFIG_PATH: &str = "assets/combat.toml";

/// Optional weapon catalog override.
pub const WEAPONS_PATH: &str = "assets/weapons.toml";
