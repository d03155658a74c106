//! Weapon data and firing geometry.
//!
//! - [`catalog`]: weapon definitions, unlock rules, the catalog resource
//! - [`economy`]: currency balances spent by discharges
//! - [`trajectory`]: expanding a discharge into spawn descriptors

pub mod catalog;
pub mod economy;
pub mod trajectory;

pub use catalog::{
    load_weapon_catalog, parse_weapon_catalog, Currency, PlayerProgression, ProjectileVisual,
    Splash, UnlockRule, WeaponCatalog, WeaponDefinition,
};
pub use economy::Wallet;
pub use trajectory::{compose, compose_into, Aim, Facing, FireDirection, SpawnDescriptor};
