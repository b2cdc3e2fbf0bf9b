//! Built-in capability units.

pub mod base;

use crate::registry::UnitDef;

/// The fixed built-in registration list. Project-local units are injected
/// separately by the embedding application.
pub fn built_in() -> Vec<UnitDef> {
    vec![base::DEF]
}
