//! Weapon definitions, unlock rules, and the read-only catalog resource.
//!
//! The catalog is built once at startup (from the built-in table or
//! `assets/weapons.toml`) and then only read.  Every definition is validated
//! when the catalog is constructed, so downstream code can trust the
//! invariants listed on [`WeaponDefinition`].

use crate::constants::PIERCE_UNLIMITED;
use crate::error::{CombatError, CombatResult};
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Currency consumed by a discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Coins,
    Gems,
    Energy,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Coins, Currency::Gems, Currency::Energy];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Currency::Coins => 0,
            Currency::Gems => 1,
            Currency::Energy => 2,
        }
    }
}

/// Sprite family a pooled projectile handle is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileVisual {
    #[default]
    Pellet,
    Bolt,
    Slug,
    Shell,
    Orb,
}

/// Area damage applied where a projectile hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splash {
    pub radius: f32,
    pub damage: f32,
}

/// One immutable weapon definition.
///
/// Invariants (checked by [`WeaponDefinition::validate`]):
/// `damage >= 0`, `speed >= 0`, `cooldown > 0`, `pellets >= 1` when present,
/// `splash_radius > 0` when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeaponDefinition {
    pub id: String,
    pub name: String,

    // ── Economy ───────────────────────────────────────────────────────────────
    /// `None` means the weapon is free to fire.
    pub currency: Option<Currency>,
    pub cost: u32,

    // ── Ballistics ────────────────────────────────────────────────────────────
    pub damage: f32,
    pub speed: f32,
    /// Seconds between discharges.  Published for the firing controller.
    pub cooldown: f32,
    pub visual: ProjectileVisual,

    // ── Special behaviour ─────────────────────────────────────────────────────
    pub pellets: Option<u32>,
    /// Angle between neighbouring pellets, in degrees.
    pub spread_angle: f32,
    pub pierce: u32,
    pub splash_radius: Option<f32>,
    pub splash_damage: f32,
    pub gravity: bool,
    /// Reserved: carried onto projectiles but not steered.
    pub homing: bool,
}

impl Default for WeaponDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            currency: None,
            cost: 0,
            damage: 0.0,
            speed: 0.0,
            cooldown: 1.0,
            visual: ProjectileVisual::default(),
            pellets: None,
            spread_angle: 0.0,
            pierce: 0,
            splash_radius: None,
            splash_damage: 0.0,
            gravity: false,
            homing: false,
        }
    }
}

impl WeaponDefinition {
    /// Reject definitions that break the catalog invariants.
    pub fn validate(&self) -> CombatResult<()> {
        let invalid = |reason| {
            Err(CombatError::InvalidWeapon {
                id: self.id.clone(),
                reason,
            })
        };
        if self.id.is_empty() {
            return invalid("id must not be empty");
        }
        if !(self.damage >= 0.0) {
            return invalid("damage must be >= 0");
        }
        if !(self.speed >= 0.0) {
            return invalid("speed must be >= 0");
        }
        if !(self.cooldown > 0.0) {
            return invalid("cooldown must be > 0");
        }
        if self.pellets == Some(0) {
            return invalid("pellet count must be >= 1");
        }
        if !self.spread_angle.is_finite() {
            return invalid("spread angle must be finite");
        }
        if let Some(radius) = self.splash_radius {
            if !(radius > 0.0) {
                return invalid("splash radius must be > 0");
            }
            if !(self.splash_damage >= 0.0) {
                return invalid("splash damage must be >= 0");
            }
        }
        Ok(())
    }

    /// Number of projectiles per discharge, clamped to at least one.
    #[inline]
    pub fn pellet_count(&self) -> u32 {
        self.pellets.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn splash(&self) -> Option<Splash> {
        self.splash_radius.map(|radius| Splash {
            radius,
            damage: self.splash_damage,
        })
    }

    #[inline]
    pub fn pierces_everything(&self) -> bool {
        self.pierce >= PIERCE_UNLIMITED
    }

    /// Currency and amount spent per discharge, if any.
    #[inline]
    pub fn discharge_cost(&self) -> Option<(Currency, u32)> {
        match self.currency {
            Some(currency) if self.cost > 0 => Some((currency, self.cost)),
            _ => None,
        }
    }
}

/// Condition under which a weapon becomes available.
///
/// Rule kinds this build does not understand deserialize to `Unsupported`
/// and never unlock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockRule {
    Always,
    Level { level: u32 },
    Mission { mission: String },
    #[serde(other)]
    Unsupported,
}

impl UnlockRule {
    pub fn is_satisfied(&self, progression: &PlayerProgression) -> bool {
        match self {
            UnlockRule::Always => true,
            UnlockRule::Level { level } => progression.level >= *level,
            UnlockRule::Mission { mission } => progression.completed_missions.contains(mission),
            UnlockRule::Unsupported => false,
        }
    }
}

/// Externally owned player progression, read by unlock checks.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProgression {
    pub level: u32,
    pub completed_missions: HashSet<String>,
}

impl PlayerProgression {
    pub fn at_level(level: u32) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_mission(mut self, mission: impl Into<String>) -> Self {
        self.completed_missions.insert(mission.into());
        self
    }
}

/// Read-only weapon table, in declaration order.
#[derive(Resource, Debug, Clone)]
pub struct WeaponCatalog {
    weapons: Vec<WeaponDefinition>,
    by_id: HashMap<String, usize>,
    unlocks: HashMap<String, UnlockRule>,
}

impl WeaponCatalog {
    /// Build a catalog, validating every definition.
    ///
    /// Unlock rules naming weapons that are not in `weapons` are ignored.
    pub fn new(
        weapons: Vec<WeaponDefinition>,
        unlocks: HashMap<String, UnlockRule>,
    ) -> CombatResult<Self> {
        let mut by_id = HashMap::with_capacity(weapons.len());
        for (index, weapon) in weapons.iter().enumerate() {
            weapon.validate()?;
            if by_id.insert(weapon.id.clone(), index).is_some() {
                return Err(CombatError::DuplicateWeapon {
                    id: weapon.id.clone(),
                });
            }
        }
        Ok(Self {
            weapons,
            by_id,
            unlocks,
        })
    }

    /// Definition for `id`; `None` means the caller should treat the fire as a no-op.
    #[inline]
    pub fn lookup(&self, id: &str) -> Option<&WeaponDefinition> {
        self.index_of(id).map(|i| &self.weapons[i])
    }

    #[inline]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&WeaponDefinition> {
        self.weapons.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponDefinition> {
        self.weapons.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn unlock_rule(&self, id: &str) -> Option<&UnlockRule> {
        self.unlocks.get(id)
    }

    /// Fails closed: unknown weapons and weapons without a rule are locked.
    pub fn is_unlocked(&self, id: &str, progression: &PlayerProgression) -> bool {
        if !self.by_id.contains_key(id) {
            return false;
        }
        self.unlocks
            .get(id)
            .is_some_and(|rule| rule.is_satisfied(progression))
    }

    /// Unlocked weapons in declaration order.
    pub fn list_unlocked(&self, progression: &PlayerProgression) -> Vec<&WeaponDefinition> {
        self.weapons
            .iter()
            .filter(|w| self.is_unlocked(&w.id, progression))
            .collect()
    }
}

// ── Data file ─────────────────────────────────────────────────────────────────

/// Layout of `assets/weapons.toml`.
///
/// ```toml
/// [[weapons]]
/// id = "bonk"
/// name = "Bonk"
/// damage = 25.0
/// speed = 400.0
/// cooldown = 0.25
///
/// [unlocks]
/// bonk = { kind = "always" }
/// ```
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    weapons: Vec<WeaponDefinition>,
    #[serde(default)]
    unlocks: HashMap<String, UnlockRule>,
}

/// Parse and validate a catalog from TOML text.  `source` labels errors.
pub fn parse_weapon_catalog(source: &str, contents: &str) -> CombatResult<WeaponCatalog> {
    let file: CatalogFile = toml::from_str(contents).map_err(|e| CombatError::ConfigParse {
        path: source.to_string(),
        message: e.to_string(),
    })?;
    WeaponCatalog::new(file.weapons, file.unlocks)
}

/// Startup system: replace the built-in catalog with the weapons file named
/// by the config, if one exists and validates.
pub fn load_weapon_catalog(
    mut catalog: ResMut<WeaponCatalog>,
    config: Res<crate::config::CombatConfig>,
) {
    let path = config.weapons_path.as_str();
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_weapon_catalog(path, &contents) {
            Ok(loaded) => {
                info!("Loaded {} weapons from {path}", loaded.len());
                *catalog = loaded;
            }
            Err(e) => error!("{e}; keeping built-in weapon catalog"),
        },
        Err(_) => info!("No {path} found; using built-in weapon catalog"),
    }
}

// ── Built-in table ────────────────────────────────────────────────────────────

fn builtin_weapons() -> Vec<WeaponDefinition> {
    vec![
        WeaponDefinition {
            id: "bonk".into(),
            name: "Bonk".into(),
            damage: 25.0,
            speed: 400.0,
            cooldown: 0.25,
            ..Default::default()
        },
        WeaponDefinition {
            id: "spread".into(),
            name: "Spread Shot".into(),
            currency: Some(Currency::Coins),
            cost: 1,
            damage: 15.0,
            speed: 350.0,
            cooldown: 0.45,
            pellets: Some(3),
            spread_angle: 18.0,
            ..Default::default()
        },
        WeaponDefinition {
            id: "rail".into(),
            name: "Rail Driver".into(),
            currency: Some(Currency::Energy),
            cost: 2,
            damage: 40.0,
            speed: 900.0,
            cooldown: 0.8,
            visual: ProjectileVisual::Bolt,
            pierce: 3,
            ..Default::default()
        },
        WeaponDefinition {
            id: "flak".into(),
            name: "Flak Burst".into(),
            currency: Some(Currency::Coins),
            cost: 3,
            damage: 10.0,
            speed: 300.0,
            cooldown: 0.9,
            visual: ProjectileVisual::Slug,
            pellets: Some(5),
            spread_angle: 12.0,
            splash_radius: Some(24.0),
            splash_damage: 6.0,
            ..Default::default()
        },
        WeaponDefinition {
            id: "mortar".into(),
            name: "Mortar".into(),
            currency: Some(Currency::Gems),
            cost: 1,
            damage: 60.0,
            speed: 520.0,
            cooldown: 1.5,
            visual: ProjectileVisual::Shell,
            splash_radius: Some(80.0),
            splash_damage: 35.0,
            gravity: true,
            ..Default::default()
        },
        WeaponDefinition {
            id: "valor".into(),
            name: "Valor Lance".into(),
            currency: Some(Currency::Gems),
            cost: 2,
            damage: 50.0,
            speed: 700.0,
            cooldown: 1.2,
            visual: ProjectileVisual::Bolt,
            pierce: PIERCE_UNLIMITED,
            ..Default::default()
        },
        WeaponDefinition {
            id: "seeker".into(),
            name: "Seeker".into(),
            currency: Some(Currency::Energy),
            cost: 1,
            damage: 20.0,
            speed: 260.0,
            cooldown: 0.6,
            visual: ProjectileVisual::Orb,
            homing: true,
            ..Default::default()
        },
    ]
}

fn builtin_unlocks() -> HashMap<String, UnlockRule> {
    HashMap::from([
        ("bonk".to_string(), UnlockRule::Always),
        ("spread".to_string(), UnlockRule::Level { level: 2 }),
        ("rail".to_string(), UnlockRule::Level { level: 4 }),
        ("flak".to_string(), UnlockRule::Level { level: 5 }),
        ("mortar".to_string(), UnlockRule::Level { level: 7 }),
        (
            "valor".to_string(),
            UnlockRule::Mission {
                mission: "siege_of_valor".to_string(),
            },
        ),
        ("seeker".to_string(), UnlockRule::Unsupported),
    ])
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        let weapons = builtin_weapons();
        let by_id = weapons
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id.clone(), i))
            .collect();
        Self {
            weapons,
            by_id,
            unlocks: builtin_unlocks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_passes_validation() {
        let rebuilt = WeaponCatalog::new(builtin_weapons(), builtin_unlocks());
        assert!(rebuilt.is_ok(), "built-in weapons must validate: {rebuilt:?}");
    }

    #[test]
    fn lookup_known_and_unknown() {
        let catalog = WeaponCatalog::default();
        let bonk = catalog.lookup("bonk").expect("bonk is built in");
        assert_eq!(bonk.damage, 25.0);
        assert_eq!(bonk.speed, 400.0);
        assert!(catalog.lookup("peashooter").is_none());
    }

    #[test]
    fn mortar_requires_level_seven() {
        let catalog = WeaponCatalog::default();
        assert!(!catalog.is_unlocked("mortar", &PlayerProgression::at_level(6)));
        assert!(catalog.is_unlocked("mortar", &PlayerProgression::at_level(7)));
    }

    #[test]
    fn mission_rule_checks_completed_set() {
        let catalog = WeaponCatalog::default();
        let veteran = PlayerProgression::at_level(50);
        assert!(!catalog.is_unlocked("valor", &veteran));
        let hero = veteran.with_mission("siege_of_valor");
        assert!(catalog.is_unlocked("valor", &hero));
    }

    #[test]
    fn unknown_weapon_and_unsupported_rule_fail_closed() {
        let catalog = WeaponCatalog::default();
        let anyone = PlayerProgression::at_level(99).with_mission("siege_of_valor");
        assert!(!catalog.is_unlocked("peashooter", &anyone));
        assert!(!catalog.is_unlocked("seeker", &anyone));
    }

    #[test]
    fn weapon_without_rule_is_locked() {
        let catalog = WeaponCatalog::new(
            vec![WeaponDefinition {
                id: "orphan".into(),
                damage: 1.0,
                speed: 1.0,
                ..Default::default()
            }],
            HashMap::new(),
        )
        .unwrap();
        assert!(!catalog.is_unlocked("orphan", &PlayerProgression::at_level(99)));
    }

    #[test]
    fn list_unlocked_keeps_declaration_order() {
        let catalog = WeaponCatalog::default();
        let ids: Vec<&str> = catalog
            .list_unlocked(&PlayerProgression::at_level(5))
            .iter()
            .map(|w| w.id.as_str())
            .collect();
        assert_eq!(ids, vec!["bonk", "spread", "rail", "flak"]);
    }

    #[test]
    fn validation_rejects_broken_definitions() {
        let base = WeaponDefinition {
            id: "w".into(),
            damage: 1.0,
            speed: 1.0,
            ..Default::default()
        };
        let cases = [
            WeaponDefinition { cooldown: 0.0, ..base.clone() },
            WeaponDefinition { damage: -1.0, ..base.clone() },
            WeaponDefinition { pellets: Some(0), ..base.clone() },
            WeaponDefinition { splash_radius: Some(0.0), ..base.clone() },
            WeaponDefinition { id: String::new(), ..base.clone() },
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(CombatError::InvalidWeapon { .. })),
                "expected rejection for {case:?}"
            );
        }
        assert!(base.validate().is_ok());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let w = WeaponDefinition {
            id: "twin".into(),
            damage: 1.0,
            speed: 1.0,
            ..Default::default()
        };
        let err = WeaponCatalog::new(vec![w.clone(), w], HashMap::new()).unwrap_err();
        assert_eq!(err, CombatError::DuplicateWeapon { id: "twin".into() });
    }

    #[test]
    fn toml_catalog_parses_rules_including_unknown_kinds() {
        let src = r#"
            [[weapons]]
            id = "zapper"
            name = "Zapper"
            currency = "energy"
            cost = 2
            damage = 12.0
            speed = 500.0
            cooldown = 0.3
            pellets = 2
            spread_angle = 10.0

            [[weapons]]
            id = "lobber"
            damage = 30.0
            speed = 200.0
            cooldown = 1.0
            gravity = true
            splash_radius = 40.0
            splash_damage = 10.0
            visual = "shell"

            [unlocks]
            zapper = { kind = "level", level = 3 }
            lobber = { kind = "achievement", name = "lobster" }
        "#;
        let catalog = parse_weapon_catalog("inline", src).unwrap();
        assert_eq!(catalog.len(), 2);
        let zapper = catalog.lookup("zapper").unwrap();
        assert_eq!(zapper.discharge_cost(), Some((Currency::Energy, 2)));
        assert_eq!(zapper.pellet_count(), 2);
        assert_eq!(
            catalog.unlock_rule("lobber"),
            Some(&UnlockRule::Unsupported)
        );
        assert!(catalog.is_unlocked("zapper", &PlayerProgression::at_level(3)));
        assert!(!catalog.is_unlocked("lobber", &PlayerProgression::at_level(99)));
        assert_eq!(
            catalog.lookup("lobber").unwrap().splash(),
            Some(Splash { radius: 40.0, damage: 10.0 })
        );
    }

    #[test]
    fn toml_catalog_with_invalid_weapon_is_rejected() {
        let src = r#"
            [[weapons]]
            id = "stuck"
            damage = 1.0
            speed = 1.0
            cooldown = 0.0
        "#;
        assert!(matches!(
            parse_weapon_catalog("inline", src),
            Err(CombatError::InvalidWeapon { .. })
        ));
    }

    #[test]
    fn valor_pierces_everything() {
        let catalog = WeaponCatalog::default();
        assert!(catalog.lookup("valor").unwrap().pierces_everything());
        assert!(!catalog.lookup("rail").unwrap().pierces_everything());
    }
}
