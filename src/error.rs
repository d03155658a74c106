//! Combat-specific error types.
//!
//! Frame-loop paths (firing, ticking, hit processing) never surface these to
//! the caller: they log and degrade to a no-op.  The fallible entry points
//! (`WeaponCatalog::new`, `ProjectileSimulator::try_fire`, the data-file
//! parsers) return them so tests and loaders can inspect what went wrong.
//!
//! ## Usage
//!
//! ```rust
//! use volley::error::{CombatError, CombatResult};
//!
//! fn require_positive(id: &str, cooldown: f32) -> CombatResult<()> {
//!     if cooldown > 0.0 {
//!         Ok(())
//!     } else {
//!         Err(CombatError::InvalidWeapon {
//!             id: id.to_string(),
//!             reason: "cooldown must be > 0",
//!         })
//!     }
//! }
//! ```

use std::fmt;

/// Top-level error enum for the combat engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatError {
    /// A weapon id was not present in the catalog.
    UnknownWeapon {
        /// The id that was looked up.
        id: String,
    },

    /// Two catalog entries share the same id.
    DuplicateWeapon {
        /// The repeated id.
        id: String,
    },

    /// A weapon definition breaks one of its invariants.
    InvalidWeapon {
        /// Id of the offending definition.
        id: String,
        /// Which invariant was violated.
        reason: &'static str,
    },

    /// The projectile pool has been shut down; no handles can be acquired.
    PoolClosed,

    /// A TOML data file could not be parsed.
    ConfigParse {
        /// Path (or label) of the source that failed.
        path: String,
        /// Parser message.
        message: String,
    },
}

impl fmt::Display for CombatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatError::UnknownWeapon { id } => write!(f, "unknown weapon id '{}'", id),
            CombatError::DuplicateWeapon { id } => {
                write!(f, "weapon id '{}' is declared more than once", id)
            }
            CombatError::InvalidWeapon { id, reason } => {
                write!(f, "weapon '{}' is invalid: {}", id, reason)
            }
            CombatError::PoolClosed => write!(f, "projectile pool has been shut down"),
            CombatError::ConfigParse { path, message } => {
                write!(f, "failed to parse {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for CombatError {}

/// Convenience alias: a `Result` using `CombatError` as the error type.
pub type CombatResult<T> = Result<T, CombatError>;
