//! Test Harness for the walkthrough orchestrator
//!
//! Provides:
//! - Deterministic driving on a [`ManualClock`] (`settle`, `advance`)
//! - Walkthrough invariants checked after every state change
//! - Scene graph exploration
//! - Seeded random simulation
//!
//! The `stagehand certify` command runs all of it.

pub mod explorer;
pub mod invariants;
pub mod simulator;

pub use explorer::{explore, ExplorationReport, SceneVisit};
pub use invariants::{InvariantCheck, InvariantMonitor, InvariantViolation};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};

use crate::orchestrator::Orchestrator;
use stagehand_kernel::{Clock, ManualClock, Millis};

/// Upper bound on batches applied by one [`settle`] call
pub const MAX_SETTLE_BATCHES: usize = 10_000;

/// Move the clock forward by `delta` and apply everything that became due
pub fn advance(orchestrator: &mut Orchestrator, clock: &ManualClock, delta: Millis) -> usize {
    clock.advance(delta);
    orchestrator.pump()
}

/// Jump from due time to due time until nothing is scheduled
///
/// Returns the clock time when the orchestrator went idle.
pub fn settle(orchestrator: &mut Orchestrator, clock: &ManualClock) -> Millis {
    settle_observed(orchestrator, clock, |_| {})
}

/// [`settle`], calling `observe` after every applied batch
pub fn settle_observed<F>(orchestrator: &mut Orchestrator, clock: &ManualClock, mut observe: F) -> Millis
where
    F: FnMut(&Orchestrator),
{
    for _ in 0..MAX_SETTLE_BATCHES {
        let Some(due) = orchestrator.next_due() else {
            break;
        };
        clock.set(due);
        if orchestrator.pump() > 0 {
            observe(orchestrator);
        }
    }
    clock.now()
}

/// Combined certification result
#[derive(Debug, Clone)]
pub struct CertificationReport {
    pub exploration: ExplorationReport,
    pub simulations: Vec<SimulatorReport>,
}

impl CertificationReport {
    /// Whether exploration and every simulation passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.exploration.passed() && self.simulations.iter().all(SimulatorReport::passed)
    }

    /// Human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut text = self.exploration.generate_text();
        for report in &self.simulations {
            text.push('\n');
            text.push_str(&report.generate_text());
        }
        text.push_str(&format!(
            "\n=== Certification: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        text
    }
}

/// Explore the scripted scene graph and simulate `seeds` random sessions
#[must_use]
pub fn certify(seeds: std::ops::Range<u64>, steps: usize) -> CertificationReport {
    let exploration = explore();
    let simulations = seeds
        .map(|seed| {
            run_simulator(SimulatorConfig {
                seed,
                total_operations: steps,
                ..SimulatorConfig::default()
            })
        })
        .collect();

    CertificationReport {
        exploration,
        simulations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use std::sync::Arc;

    #[test]
    fn settle_runs_the_opening_scene_to_rest() {
        let clock = ManualClock::new();
        let mut orchestrator =
            Orchestrator::with_script(OrchestratorConfig::default(), Arc::new(clock.clone())).unwrap();

        let stopped = settle(&mut orchestrator, &clock);

        assert_eq!(stopped, 6_075);
        assert!(orchestrator.is_idle());
        assert_eq!(orchestrator.snapshot().messages.len(), 2);
    }

    #[test]
    fn advance_applies_only_what_is_due() {
        let clock = ManualClock::new();
        let mut orchestrator =
            Orchestrator::with_script(OrchestratorConfig::default(), Arc::new(clock.clone())).unwrap();

        assert_eq!(advance(&mut orchestrator, &clock, 100), 1);
        assert!(orchestrator.snapshot().is_typing);
        assert!(orchestrator.snapshot().messages.is_empty());
    }

    #[test]
    fn short_certification_passes() {
        let report = certify(0..2, 40);
        assert!(report.passed(), "{}", report.generate_text());
    }
}
