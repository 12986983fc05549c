//! Testing utilities for the Stagehand workspace
//!
//! Shared fixtures, clock helpers and message lookups.

#![allow(missing_docs)]

use stagehand_core::test_harness;
use stagehand_core::{
    ChatMessage, Orchestrator, OrchestratorConfig, SceneRecipe, SceneRegistry, Snapshot,
};
use stagehand_kernel::{Clock, ManualClock, Millis};
use std::sync::Arc;

/// Orchestrator on the full script with default config, at time zero
pub fn setup_orchestrator() -> (Orchestrator, ManualClock) {
    setup_with_config(OrchestratorConfig::new())
}

pub fn setup_with_config(config: OrchestratorConfig) -> (Orchestrator, ManualClock) {
    let clock = ManualClock::new();
    let orchestrator = Orchestrator::with_script(config, Arc::new(clock.clone())).unwrap();
    (orchestrator, clock)
}

pub fn setup_with_registry(registry: SceneRegistry, start: &str) -> (Orchestrator, ManualClock) {
    let clock = ManualClock::new();
    let config = OrchestratorConfig::new().with_start_scene(start);
    let orchestrator = Orchestrator::new(config, registry, Arc::new(clock.clone())).unwrap();
    (orchestrator, clock)
}

/// Registry holding the given recipes, in order
pub fn registry_of(scenes: Vec<(&str, SceneRecipe)>) -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    for (id, recipe) in scenes {
        registry.register(id, recipe).unwrap();
    }
    registry
}

/// Orchestrator whose start scene has already come to rest
pub fn setup_settled() -> (Orchestrator, ManualClock) {
    let (mut orchestrator, clock) = setup_orchestrator();
    test_harness::settle(&mut orchestrator, &clock);
    (orchestrator, clock)
}

/// Move time forward and apply what became due
pub fn advance(orchestrator: &mut Orchestrator, clock: &ManualClock, delta: Millis) -> Snapshot {
    test_harness::advance(orchestrator, clock, delta);
    orchestrator.snapshot()
}

/// Move time to an absolute point and apply what became due
pub fn advance_to(orchestrator: &mut Orchestrator, clock: &ManualClock, at: Millis) -> Snapshot {
    clock.set(at);
    orchestrator.pump();
    orchestrator.snapshot()
}

/// Run until nothing is scheduled
pub fn settle(orchestrator: &mut Orchestrator, clock: &ManualClock) -> Snapshot {
    test_harness::settle(orchestrator, clock);
    orchestrator.snapshot()
}

pub fn now(clock: &ManualClock) -> Millis {
    clock.now()
}

/// First message whose content contains `needle`
pub fn find_message<'a>(snapshot: &'a Snapshot, needle: &str) -> Option<&'a ChatMessage> {
    snapshot
        .messages
        .iter()
        .find(|message| message.content.contains(needle))
}

/// Messages from one agent, oldest first
pub fn messages_from<'a>(snapshot: &'a Snapshot, agent: &str) -> Vec<&'a ChatMessage> {
    snapshot
        .messages
        .iter()
        .filter(|message| message.agent_name.as_deref() == Some(agent))
        .collect()
}

/// Action ids offered by the newest message that has buttons
pub fn visible_actions(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .messages
        .iter()
        .rev()
        .find(|message| !message.actions.is_empty())
        .map(|message| message.actions.iter().map(|b| b.action_id.clone()).collect())
        .unwrap_or_default()
}

pub fn scene_of(snapshot: &Snapshot) -> &str {
    snapshot
        .scene_id
        .as_ref()
        .map_or("", |scene| scene.as_str())
}
