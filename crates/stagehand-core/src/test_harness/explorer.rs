//! Scene graph exploration
//!
//! Walks every scene reachable from the start scene (buttons, auto-advances and
//! configured routes), plays each one to rest on a manual clock and checks the
//! walkthrough invariants along the way.

use super::invariants::{InvariantMonitor, InvariantViolation};
use super::settle_observed;
use crate::config::OrchestratorConfig;
use crate::mission::MissionState;
use crate::orchestrator::Orchestrator;
use crate::scenes::{canonical_registry, SceneRegistry};
use crate::types::SceneId;
use stagehand_kernel::{ManualClock, Millis};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

/// What one scene looked like once it came to rest
#[derive(Debug, Clone, PartialEq)]
pub struct SceneVisit {
    pub scene: SceneId,
    /// Scene current after auto-advances ran out
    pub rested_in: Option<SceneId>,
    /// Time from entering the scene until nothing was scheduled
    pub duration: Millis,
    pub delivered: usize,
    pub mission: MissionState,
    pub canvas: Option<&'static str>,
}

/// Exploration result
#[derive(Debug, Clone, Default)]
pub struct ExplorationReport {
    pub visits: Vec<SceneVisit>,
    pub unreachable: Vec<SceneId>,
    pub violations: Vec<(SceneId, InvariantViolation)>,
    /// Setup or entry failures
    pub errors: Vec<String>,
}

impl ExplorationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty() && self.unreachable.is_empty()
    }

    #[must_use]
    pub fn visit(&self, scene: &str) -> Option<&SceneVisit> {
        self.visits.iter().find(|visit| visit.scene.as_str() == scene)
    }

    /// Human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut text = String::from("=== Scene Graph Exploration ===\n\n");
        let _ = writeln!(text, "Scenes visited: {}", self.visits.len());
        for visit in &self.visits {
            let _ = writeln!(
                text,
                "  {:<6} -> {:<6} {:>6}ms  messages={} progress={} canvas={}",
                visit.scene.as_str(),
                visit.rested_in.as_ref().map_or("-", SceneId::as_str),
                visit.duration,
                visit.delivered,
                visit.mission.progress,
                visit.canvas.unwrap_or("none"),
            );
        }

        if !self.unreachable.is_empty() {
            let names: Vec<&str> = self.unreachable.iter().map(SceneId::as_str).collect();
            let _ = writeln!(text, "\nUnreachable: {}", names.join(", "));
        }
        if !self.violations.is_empty() {
            let _ = writeln!(text, "\nViolations:");
            for (scene, violation) in &self.violations {
                let _ = writeln!(text, "  [{scene}] {:?}: {}", violation.check, violation.details);
            }
        }
        for error in &self.errors {
            let _ = writeln!(text, "Error: {error}");
        }

        let _ = writeln!(
            text,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        text
    }
}

/// Scenes reachable from `start`, in breadth-first order
#[must_use]
pub fn reachable(registry: &SceneRegistry, config: &OrchestratorConfig) -> Vec<SceneId> {
    let edges = registry.edges();
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<SceneId> = VecDeque::new();

    queue.push_back(config.start_scene.clone());
    queue.extend(config.action_routes.values().cloned());

    while let Some(scene) = queue.pop_front() {
        if !registry.contains(scene.as_str()) || !seen.insert(scene.clone()) {
            continue;
        }
        queue.extend(
            edges
                .iter()
                .filter(|edge| edge.from == scene)
                .map(|edge| edge.to.clone()),
        );
        order.push(scene);
    }
    order
}

/// Explore the scripted walkthrough with the default configuration
#[must_use]
pub fn explore() -> ExplorationReport {
    let config = OrchestratorConfig::default();
    match canonical_registry() {
        Ok(registry) => explore_with(&config, &registry),
        Err(err) => ExplorationReport {
            errors: vec![err.to_string()],
            ..ExplorationReport::default()
        },
    }
}

/// Explore `registry` under `config`
#[must_use]
pub fn explore_with(config: &OrchestratorConfig, registry: &SceneRegistry) -> ExplorationReport {
    let mut report = ExplorationReport::default();
    let order = reachable(registry, config);

    for scene in &order {
        match visit(config, registry, scene) {
            Ok((visit, violations)) => {
                report
                    .violations
                    .extend(violations.into_iter().map(|v| (scene.clone(), v)));
                report.visits.push(visit);
            }
            Err(err) => report.errors.push(format!("{scene}: {err}")),
        }
    }

    report.unreachable = registry
        .ids()
        .filter(|id| !order.contains(id))
        .cloned()
        .collect();

    tracing::debug!(
        visited = report.visits.len(),
        unreachable = report.unreachable.len(),
        "exploration finished"
    );
    report
}

fn visit(
    config: &OrchestratorConfig,
    registry: &SceneRegistry,
    scene: &SceneId,
) -> Result<(SceneVisit, Vec<InvariantViolation>), crate::error::StageError> {
    let clock = ManualClock::new();
    let mut orchestrator = Orchestrator::new(config.clone(), registry.clone(), Arc::new(clock.clone()))?;
    let mut monitor = InvariantMonitor::new();
    let mut violations = monitor.observe(&orchestrator);

    // Let the start scene finish so the visit starts from a quiet conversation.
    settle_observed(&mut orchestrator, &clock, |o| violations.extend(monitor.observe(o)));
    let entered_at = orchestrator.now();
    let before = orchestrator.snapshot().messages.len();

    orchestrator.advance_to_scene(scene.as_str())?;
    violations.extend(monitor.observe(&orchestrator));
    let rested = settle_observed(&mut orchestrator, &clock, |o| violations.extend(monitor.observe(o)));

    let snapshot = orchestrator.snapshot();
    let visit = SceneVisit {
        scene: scene.clone(),
        rested_in: snapshot.scene_id.clone(),
        duration: rested.saturating_sub(entered_at),
        delivered: snapshot.messages.len() - before,
        canvas: snapshot.canvas.as_ref().map(|canvas| canvas.type_tag()),
        mission: snapshot.mission,
    };
    Ok((visit, violations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scripted_scene_is_reachable_and_clean() {
        let report = explore();
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.visits.len(), 16);
    }

    #[test]
    fn auto_advancing_scenes_rest_in_their_successor() {
        let report = explore();
        let scan = report.visit("S2").unwrap();
        assert_eq!(scan.rested_in, Some(SceneId::new("S3")));
        assert_eq!(scan.mission.progress, 20);

        let qa = report.visit("S14").unwrap();
        assert_eq!(qa.rested_in, Some(SceneId::new("S15")));
        assert_eq!(qa.mission.progress, 100);
    }

    #[test]
    fn orphan_scene_is_reported() {
        let mut registry = canonical_registry().unwrap();
        registry
            .register("S99", crate::scenes::SceneRecipe::new())
            .unwrap();
        let report = explore_with(&OrchestratorConfig::default(), &registry);
        assert_eq!(report.unreachable, vec![SceneId::new("S99")]);
        assert!(!report.passed());
    }
}
