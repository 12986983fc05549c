//! Walkthrough Simulator - seeded random sessions against the orchestrator
//!
//! A session is a random mix of button presses, free-text messages, expert-desk
//! requests, direct navigation and clock movement, with a sprinkling of invalid
//! requests that must leave state untouched. Invariants are checked after every
//! operation.

use super::invariants::{InvariantMonitor, InvariantViolation};
use crate::actions::ActionOutcome;
use crate::config::OrchestratorConfig;
use crate::expert::{ExpertAction, ExpertOutcome};
use crate::orchestrator::Orchestrator;
use crate::types::{AgentRole, SceneId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use stagehand_kernel::{Clock, ManualClock, Millis};
use std::collections::BTreeMap;
use std::sync::Arc;

const USER_LINES: [&str; 4] = [
    "Can you explain the bundle pricing?",
    "What happens to our approval rules?",
    "ok",
    "How long will phase 1 take?",
];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: usize,
    /// Distribution of operation types
    pub operation_distribution: OperationDistribution,
    /// Longest single clock step
    pub max_clock_step: Millis,
    /// Stop conditions
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 500,
            operation_distribution: OperationDistribution::default(),
            max_clock_step: 3_000,
            stop_on_first_violation: true,
        }
    }
}

/// Probability distribution for operation generation
#[derive(Debug, Clone)]
pub struct OperationDistribution {
    /// Presses, messages, expert requests, clock steps
    pub valid_ops: f64,
    /// Stale buttons, re-entry, zero-length clock steps
    pub edge_cases: f64,
    /// Unknown scenes and actions (should be rejected)
    pub invalid_ops: f64,
}

impl Default for OperationDistribution {
    fn default() -> Self {
        Self {
            valid_ops: 0.70,
            edge_cases: 0.20,
            invalid_ops: 0.10,
        }
    }
}

/// All operations the simulator can generate
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedOperation {
    AdvanceClock(Millis),
    PressVisibleButton(String),
    DispatchScripted(String),
    DispatchUnknown(String),
    SubmitMessage(String),
    Expert(ExpertAction),
    EnterScene(SceneId),
    EnterUnknownScene(String),
}

/// Expected result classification for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    ShouldSucceed,
    ShouldFail,
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Operation outcome didn't match expectation
    UnexpectedOutcome {
        operation_index: usize,
        operation: SimulatedOperation,
        expected: ExpectedResult,
        actual: Result<String, String>,
    },
    /// Invariant was violated
    Invariant {
        operation_index: usize,
        violation: InvariantViolation,
    },
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub operations_by_type: BTreeMap<String, u64>,
}

impl OperationStats {
    pub fn record(&mut self, operation: &SimulatedOperation, result: &Result<String, String>) {
        self.total_operations += 1;

        let debug = format!("{operation:?}");
        let type_name = debug.split('(').next().unwrap_or("Unknown").to_string();
        *self.operations_by_type.entry(type_name).or_insert(0) += 1;

        match result {
            Ok(_) => self.successful_operations += 1,
            Err(_) => self.failed_operations += 1,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: OperationStats,
    pub violations: Vec<Violation>,
    pub final_scene: Option<SceneId>,
    pub final_time: Millis,
    pub final_messages: usize,
    pub final_outputs: usize,
}

impl SimulatorReport {
    /// Check if simulation passed (no violations)
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Walkthrough Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Total Operations: {}\n", self.stats.total_operations));
        report.push_str(&format!("Successful: {}\n", self.stats.successful_operations));
        report.push_str(&format!("Rejected: {}\n", self.stats.failed_operations));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));
        report.push_str(&format!(
            "Final Scene: {}\n",
            self.final_scene.as_ref().map_or("-", SceneId::as_str)
        ));
        report.push_str(&format!("Final Time: {}ms\n", self.final_time));
        report.push_str(&format!("Final Messages: {}\n", self.final_messages));
        report.push_str(&format!("Expert Outputs: {}\n", self.final_outputs));

        if !self.stats.operations_by_type.is_empty() {
            report.push_str("\n=== Operations ===\n");
            for (name, count) in &self.stats.operations_by_type {
                report.push_str(&format!("{name}: {count}\n"));
            }
        }

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run one seeded session against the scripted walkthrough
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let clock = ManualClock::new();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();

    let mut orchestrator =
        match Orchestrator::with_script(OrchestratorConfig::default(), Arc::new(clock.clone())) {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                violations.push(Violation::UnexpectedOutcome {
                    operation_index: 0,
                    operation: SimulatedOperation::AdvanceClock(0),
                    expected: ExpectedResult::ShouldSucceed,
                    actual: Err(err.to_string()),
                });
                return SimulatorReport {
                    config,
                    stats,
                    violations,
                    final_scene: None,
                    final_time: 0,
                    final_messages: 0,
                    final_outputs: 0,
                };
            }
        };
    let scenes: Vec<SceneId> = orchestrator.registry().ids().cloned().collect();
    let scripted: Vec<String> = orchestrator
        .registry()
        .edges()
        .into_iter()
        .filter_map(|edge| edge.via)
        .collect();
    let mut monitor = InvariantMonitor::new();
    monitor.observe(&orchestrator);

    for i in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &config, &orchestrator, &scenes, &scripted);
        let expected = classify_expected_result(&operation);
        let actual = execute_operation(&mut orchestrator, &clock, &operation);

        let outcome_matches = matches!(
            (expected, &actual),
            (ExpectedResult::ShouldSucceed, Ok(_)) | (ExpectedResult::ShouldFail, Err(_))
        );
        if !outcome_matches {
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation: operation.clone(),
                expected,
                actual: actual.clone(),
            });
            if config.stop_on_first_violation {
                break;
            }
        }

        let found = monitor.observe(&orchestrator);
        if !found.is_empty() {
            violations.extend(found.into_iter().map(|violation| Violation::Invariant {
                operation_index: i,
                violation,
            }));
            if config.stop_on_first_violation {
                break;
            }
        }

        stats.record(&operation, &actual);
    }

    tracing::debug!(
        seed = config.seed,
        operations = stats.total_operations,
        violations = violations.len(),
        "simulation finished"
    );

    let snapshot = orchestrator.snapshot();
    SimulatorReport {
        final_scene: snapshot.scene_id,
        final_time: clock.now(),
        final_messages: snapshot.messages.len(),
        final_outputs: orchestrator.expert_outputs().len(),
        config,
        stats,
        violations,
    }
}

fn generate_operation(
    rng: &mut StdRng,
    config: &SimulatorConfig,
    orchestrator: &Orchestrator,
    scenes: &[SceneId],
    scripted: &[String],
) -> SimulatedOperation {
    let distribution = &config.operation_distribution;
    let r: f64 = rng.gen();

    if r < distribution.valid_ops {
        generate_valid_operation(rng, config, orchestrator)
    } else if r < distribution.valid_ops + distribution.edge_cases {
        generate_edge_case_operation(rng, scenes, scripted)
    } else {
        generate_invalid_operation(rng)
    }
}

fn generate_valid_operation(
    rng: &mut StdRng,
    config: &SimulatorConfig,
    orchestrator: &Orchestrator,
) -> SimulatedOperation {
    let visible: Vec<String> = orchestrator
        .store()
        .messages()
        .iter()
        .rev()
        .find(|message| !message.actions.is_empty())
        .map(|message| message.actions.iter().map(|b| b.action_id.clone()).collect())
        .unwrap_or_default();

    match rng.gen_range(0..6) {
        0 | 1 if !visible.is_empty() => {
            SimulatedOperation::PressVisibleButton(visible[rng.gen_range(0..visible.len())].clone())
        }
        2 => SimulatedOperation::SubmitMessage(
            USER_LINES[rng.gen_range(0..USER_LINES.len())].to_string(),
        ),
        3 => SimulatedOperation::Expert(ExpertAction::ALL[rng.gen_range(0..ExpertAction::ALL.len())]),
        _ => SimulatedOperation::AdvanceClock(rng.gen_range(1..=config.max_clock_step)),
    }
}

fn generate_edge_case_operation(
    rng: &mut StdRng,
    scenes: &[SceneId],
    scripted: &[String],
) -> SimulatedOperation {
    match rng.gen_range(0..3) {
        0 if !scripted.is_empty() => {
            SimulatedOperation::DispatchScripted(scripted[rng.gen_range(0..scripted.len())].clone())
        }
        1 if !scenes.is_empty() => {
            SimulatedOperation::EnterScene(scenes[rng.gen_range(0..scenes.len())].clone())
        }
        _ => SimulatedOperation::AdvanceClock(0),
    }
}

fn generate_invalid_operation(rng: &mut StdRng) -> SimulatedOperation {
    if rng.gen_bool(0.5) {
        SimulatedOperation::EnterUnknownScene(format!("S{}", rng.gen_range(100..1000)))
    } else {
        SimulatedOperation::DispatchUnknown(format!("no_such_action_{}", rng.gen_range(0..100)))
    }
}

fn classify_expected_result(operation: &SimulatedOperation) -> ExpectedResult {
    match operation {
        SimulatedOperation::DispatchUnknown(_) | SimulatedOperation::EnterUnknownScene(_) => {
            ExpectedResult::ShouldFail
        }
        _ => ExpectedResult::ShouldSucceed,
    }
}

fn execute_operation(
    orchestrator: &mut Orchestrator,
    clock: &ManualClock,
    operation: &SimulatedOperation,
) -> Result<String, String> {
    match operation {
        SimulatedOperation::AdvanceClock(delta) => {
            let applied = super::advance(orchestrator, clock, *delta);
            Ok(format!("{applied} applied"))
        }
        SimulatedOperation::PressVisibleButton(action_id)
        | SimulatedOperation::DispatchScripted(action_id) => {
            match orchestrator.dispatch_action(action_id, None) {
                outcome @ (ActionOutcome::Navigated { .. } | ActionOutcome::Notice { .. }) => {
                    Ok(format!("{outcome:?}"))
                }
                outcome => Err(format!("{outcome:?}")),
            }
        }
        SimulatedOperation::DispatchUnknown(action_id) => {
            let before = orchestrator.snapshot();
            match orchestrator.dispatch_action(action_id, None) {
                ActionOutcome::Unhandled if orchestrator.snapshot() == before => {
                    Err("unhandled".to_string())
                }
                outcome => Ok(format!("{outcome:?}")),
            }
        }
        SimulatedOperation::SubmitMessage(text) => {
            let id = orchestrator.submit_user_message(text);
            let snapshot = orchestrator.snapshot();
            match snapshot.last_message() {
                Some(last) if last.id == id && last.role == AgentRole::User => Ok(id.to_string()),
                other => Err(format!("last message after submit: {other:?}")),
            }
        }
        SimulatedOperation::Expert(action) => {
            let was_typing = orchestrator.snapshot().is_typing;
            match (was_typing, orchestrator.handle_expert_action(*action)) {
                (true, ExpertOutcome::Busy) => Ok("busy".to_string()),
                (false, ExpertOutcome::Queued { lands_at }) if lands_at > orchestrator.now() => {
                    Ok(format!("queued until {lands_at}"))
                }
                (typing, outcome) => Err(format!("typing={typing} outcome={outcome:?}")),
            }
        }
        SimulatedOperation::EnterScene(scene) => orchestrator
            .advance_to_scene(scene.as_str())
            .map(|generation| generation.to_string())
            .map_err(|err| err.to_string()),
        SimulatedOperation::EnterUnknownScene(scene) => {
            let before = orchestrator.snapshot();
            match orchestrator.advance_to_scene(scene) {
                Err(err) if orchestrator.snapshot() == before => Err(err.to_string()),
                Err(err) => Ok(format!("rejected but state changed: {err}")),
                Ok(generation) => Ok(generation.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_is_deterministic_per_seed() {
        let config = SimulatorConfig {
            seed: 7,
            total_operations: 200,
            ..SimulatorConfig::default()
        };
        let first = run_simulator(config.clone());
        let second = run_simulator(config);

        assert_eq!(first.final_scene, second.final_scene);
        assert_eq!(first.final_time, second.final_time);
        assert_eq!(first.final_messages, second.final_messages);
        assert_eq!(first.stats.operations_by_type, second.stats.operations_by_type);
    }

    #[test]
    fn simulator_runs_clean_across_seeds() {
        for seed in 0..10 {
            let report = run_simulator(SimulatorConfig {
                seed,
                total_operations: 300,
                ..SimulatorConfig::default()
            });
            assert!(report.passed(), "{}", report.generate_text());
        }
    }

    #[test]
    fn report_text_has_result_line() {
        let report = run_simulator(SimulatorConfig {
            total_operations: 10,
            ..SimulatorConfig::default()
        });
        let text = report.generate_text();
        assert!(text.starts_with("=== Walkthrough Simulator Report ==="));
        assert!(text.contains("Seed: 42"));
        assert!(text.contains("=== Result: PASS ==="));
    }
}
