//! The migration walkthrough
//!
//! Sixteen scenes across the four migration phases:
//! - `discover`: welcome, scan, usage radar, dependencies (`S0`..`S5`)
//! - `plan`: phase 1 proposal and stakeholder check (`S6_80`, `S7`)
//! - `convert`: logic translation and replay suite (`S8`, `S9`)
//! - `verify`: parity replays, diff and re-run (`S10`..`S13`)
//! - `run`: QA deployment and summary (`S14`, `S15`)
//!
//! All content is literal. Canonical path:
//! `S0 → S2 ⇒ S3 → S4 → S5 → S6_80 → S7 → S8 → S9 → S10 ⇒ S11 → S12 ⇒ S13 → S14 ⇒ S15`
//! (`⇒` marks auto-advance).

mod convert;
mod discover;
mod plan;
mod run;
mod verify;

use super::SceneRegistry;
use crate::canvas::{InventoryRow, StatCard};
use crate::error::RecipeError;

pub(crate) const MIGRATION_AGENT: &str = "Migration Agent";
pub(crate) const NAVIGATOR_AGENT: &str = "Navigator Agent";
pub(crate) const SCANNER_AGENT: &str = "Org Scanner Agent";
pub(crate) const PLANNER_AGENT: &str = "Priority Planner Agent";
pub(crate) const TRANSLATOR_AGENT: &str = "Logic Translator Agent";
pub(crate) const PROVER_AGENT: &str = "Parity Prover Agent";
pub(crate) const RUNNER_AGENT: &str = "Migration Runner Agent";

/// Effect name for buttons that only show a notification
pub const TOAST: &str = "toast";

/// Scene ids along the canonical path, in order
pub const CANONICAL_PATH: [&str; 15] = [
    "S0", "S2", "S3", "S4", "S5", "S6_80", "S7", "S8", "S9", "S10", "S11", "S12", "S13", "S14",
    "S15",
];

/// Registry holding the full walkthrough
///
/// # Errors
/// Any [`RecipeError`] from registration or target validation.
pub fn canonical_registry() -> Result<SceneRegistry, RecipeError> {
    let mut registry = SceneRegistry::new();
    discover::register(&mut registry)?;
    plan::register(&mut registry)?;
    convert::register(&mut registry)?;
    verify::register(&mut registry)?;
    run::register(&mut registry)?;
    registry.validate()?;
    Ok(registry)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn row(name: &str, kind: &str, usage: &str, complexity: &str) -> InventoryRow {
    InventoryRow {
        name: name.to_string(),
        kind: kind.to_string(),
        usage: usage.to_string(),
        complexity: complexity.to_string(),
    }
}

fn stat(label: &str, value: &str, trend: &str) -> StatCard {
    StatCard {
        label: label.to_string(),
        value: value.to_string(),
        trend: trend.to_string(),
    }
}
