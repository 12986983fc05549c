//! Action dispatch: routes, buttons, notices and the action log

use pretty_assertions::assert_eq;
use serde_json::json;
use stagehand_core::{
    ActionOutcome, ExpertOutcome, OrchestratorConfig, SceneId, SceneRecipe, Utterance,
};
use stagehand_core::types::ActionButton;
use stagehand_kernel::Generation;
use stagehand_test_utils::*;

#[test]
fn configured_route_navigates_without_a_button() {
    let (mut orchestrator, clock) = setup_orchestrator();
    // Nothing is on screen yet.
    assert!(orchestrator.snapshot().messages.is_empty());

    let outcome = orchestrator.dispatch_action("run_scan", None);
    assert_eq!(
        outcome,
        ActionOutcome::Navigated {
            scene: SceneId::new("S2"),
            generation: Generation(2),
        }
    );
    let snapshot = settle(&mut orchestrator, &clock);
    assert_eq!(scene_of(&snapshot), "S3");
}

#[test]
fn confirm_intent_route_jumps_to_the_replay_suite() {
    let (mut orchestrator, clock) = setup_settled();
    let outcome = orchestrator.dispatch_action("confirm_intent", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "S9"));

    let snapshot = settle(&mut orchestrator, &clock);
    assert_eq!(snapshot.canvas.as_ref().unwrap().type_tag(), "replay_progress");
    assert_eq!(visible_actions(&snapshot), vec!["run_replays"]);
}

#[test]
fn on_screen_button_navigates_to_its_target() {
    let (mut orchestrator, clock) = setup_settled();
    let outcome = orchestrator.dispatch_action("view_scope", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "S1"));

    let snapshot = settle(&mut orchestrator, &clock);
    assert_eq!(snapshot.mission.phase, "Discover");
    assert_eq!(visible_actions(&snapshot), vec!["scan_org", "load_scan"]);
}

#[test]
fn effect_buttons_produce_notices_and_change_nothing() {
    let (mut orchestrator, clock) = setup_settled();
    orchestrator.advance_to_scene("S1").unwrap();
    settle(&mut orchestrator, &clock);
    let before = orchestrator.snapshot();

    let outcome = orchestrator.dispatch_action("load_scan", None);
    assert_eq!(outcome, ActionOutcome::Notice { effect: "toast".into() });
    assert_eq!(orchestrator.snapshot(), before);
    assert!(orchestrator.is_idle());
}

#[test]
fn unknown_actions_are_logged_as_unhandled() {
    let (mut orchestrator, clock) = setup_settled();
    let before = orchestrator.snapshot();

    let outcome = orchestrator.dispatch_action("launch_rocket", Some(json!({"speed": 3})));
    assert_eq!(outcome, ActionOutcome::Unhandled);
    assert_eq!(orchestrator.snapshot(), before);

    let log = orchestrator.action_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].action_id, "launch_rocket");
    assert_eq!(log[0].params, Some(json!({"speed": 3})));
    assert_eq!(log[0].at, now(&clock));
    assert_eq!(log[0].outcome, ActionOutcome::Unhandled);
}

#[test]
fn route_to_a_missing_scene_reports_the_target() {
    let config = OrchestratorConfig::new().with_route("teleport", "S404");
    let (mut orchestrator, clock) = setup_with_config(config);
    settle(&mut orchestrator, &clock);
    let before = orchestrator.snapshot();

    let outcome = orchestrator.dispatch_action("teleport", None);
    assert_eq!(
        outcome,
        ActionOutcome::UnknownTarget {
            scene: SceneId::new("S404")
        }
    );
    assert_eq!(orchestrator.snapshot(), before);
}

#[test]
fn newest_offer_of_a_button_wins() {
    let registry = registry_of(vec![
        (
            "A",
            SceneRecipe::new()
                .say(
                    Utterance::assistant("Guide", "First offer")
                        .with_actions(vec![ActionButton::navigate("Next", "next", "B")]),
                )
                .say(
                    Utterance::assistant("Guide", "Second offer")
                        .with_actions(vec![ActionButton::navigate("Next", "next", "C")]),
                ),
        ),
        ("B", SceneRecipe::new().say(Utterance::assistant("Guide", "In B"))),
        ("C", SceneRecipe::new().say(Utterance::assistant("Guide", "In C"))),
    ]);
    let (mut orchestrator, clock) = setup_with_registry(registry, "A");

    // Nothing delivered yet: the first scripted button answers.
    let outcome = orchestrator.dispatch_action("next", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "B"));

    orchestrator.advance_to_scene("A").unwrap();
    settle(&mut orchestrator, &clock);
    let outcome = orchestrator.dispatch_action("next", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "C"));
}

#[test]
fn expert_tools_dispatch_to_the_desk() {
    let (mut orchestrator, clock) = setup_settled();
    let outcome = orchestrator.dispatch_action("generate_test_plan", None);
    assert_eq!(
        outcome,
        ActionOutcome::Expert(ExpertOutcome::Queued {
            lands_at: now(&clock) + 1_335
        })
    );
    assert_eq!(orchestrator.action_log().len(), 1);
}

#[test]
fn every_dispatch_is_recorded_in_order() {
    let (mut orchestrator, clock) = setup_settled();
    orchestrator.dispatch_action("nope", None);
    orchestrator.dispatch_action("start_scan", None);
    advance(&mut orchestrator, &clock, 1_000);
    orchestrator.dispatch_action("load_scan", None);

    let ids: Vec<_> = orchestrator
        .action_log()
        .iter()
        .map(|record| record.action_id.as_str())
        .collect();
    assert_eq!(ids, vec!["nope", "start_scan", "load_scan"]);
    assert!(orchestrator.action_log()[2].at > orchestrator.action_log()[1].at);
}
