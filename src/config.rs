//! Runtime combat configuration loaded from `assets/combat.toml`.
//!
//! [`CombatConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_combat_config`] reads
//! `assets/combat.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `CombatConfig::default()`.

use crate::constants::*;
use crate::error::{CombatError, CombatResult};
use crate::projectile::PlayfieldBounds;
use bevy::prelude::*;
use serde::Deserialize;

/// Runtime-tunable combat configuration.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // ── Playfield ────────────────────────────────────────────────────────────
    pub playfield_width: f32,
    pub playfield_height: f32,
    pub bounds_margin: f32,
    /// Recentre the playfield on the active 2D camera every frame.
    pub bounds_follow_camera: bool,

    // ── Pool ──────────────────────────────────────────────────────────────────
    pub pool_capacity: usize,

    // ── Ballistics ────────────────────────────────────────────────────────────
    pub projectile_gravity: f32,
    pub projectile_collider_radius: f32,

    // ── Data files ────────────────────────────────────────────────────────────
    pub weapons_path: String,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,
            bounds_margin: BOUNDS_MARGIN,
            bounds_follow_camera: true,
            pool_capacity: POOL_CAPACITY,
            projectile_gravity: PROJECTILE_GRAVITY,
            projectile_collider_radius: PROJECTILE_COLLIDER_RADIUS,
            weapons_path: WEAPONS_PATH.to_string(),
        }
    }
}

impl CombatConfig {
    /// Half extents of the playable rectangle including the margin.
    pub fn bounds_half_extents(&self) -> Vec2 {
        Vec2::new(
            self.playfield_width * 0.5 + self.bounds_margin,
            self.playfield_height * 0.5 + self.bounds_margin,
        )
    }

    /// Playable rectangle centred on `center`.
    pub fn bounds_around(&self, center: Vec2) -> PlayfieldBounds {
        PlayfieldBounds::centered(center, self.bounds_half_extents())
    }
}

/// Parse a combat config from TOML text.  `source` labels the error.
pub fn parse_combat_config(source: &str, contents: &str) -> CombatResult<CombatConfig> {
    toml::from_str::<CombatConfig>(contents).map_err(|e| CombatError::ConfigParse {
        path: source.to_string(),
        message: e.to_string(),
    })
}

/// Startup system: attempt to load `assets/combat.toml` and overwrite the
/// `CombatConfig` resource with any values present in the file.
///
/// A missing file is not an error (defaults are already in place).  Parse
/// errors are logged and the defaults kept.
pub fn load_combat_config(mut config: ResMut<CombatConfig>) {
    let path = COMBAT_CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_combat_config(path, &contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded combat config from {path}");
            }
            Err(e) => error!("{e}; using defaults"),
        },
        Err(_) => info!("No {path} found; using compiled defaults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = parse_combat_config("inline", "").unwrap();
        assert_eq!(cfg, CombatConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let cfg = parse_combat_config("inline", "pool_capacity = 8\nprojectile_gravity = 10.0\n")
            .unwrap();
        assert_eq!(cfg.pool_capacity, 8);
        assert_eq!(cfg.projectile_gravity, 10.0);
        assert_eq!(cfg.playfield_width, PLAYFIELD_WIDTH);
    }

    #[test]
    fn malformed_toml_reports_source() {
        let err = parse_combat_config("assets/combat.toml", "pool_capacity = \"lots\"")
            .unwrap_err();
        assert!(matches!(err, CombatError::ConfigParse { ref path, .. } if path == "assets/combat.toml"));
    }

    #[test]
    fn bounds_include_margin() {
        let cfg = CombatConfig {
            playfield_width: 100.0,
            playfield_height: 50.0,
            bounds_margin: 10.0,
            ..Default::default()
        };
        let bounds = cfg.bounds_around(Vec2::new(1000.0, 0.0));
        assert_eq!(bounds.min, Vec2::new(940.0, -35.0));
        assert_eq!(bounds.max, Vec2::new(1060.0, 35.0));
    }
}
